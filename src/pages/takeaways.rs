//! Page 4: fixed narrative summary of the analysis.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Takeaways {
    pub title: &'static str,
    pub points: &'static [&'static str],
    pub closing: &'static str,
}

const POINTS: &[&str] = &[
    "The dataset holds 1633 successfully funded US projects.",
    "California leads in both funding and number of projects, followed by New York and Washington.",
    "Average pledged per project sits around 1 million USD in almost every state.",
    "Average backers per project ranges from 6,600 in New York to 12,700 in Colorado among states with more than 10 projects.",
    "80% of projects from Georgia are in the Games category.",
    "Utah leads Publishing funding with 48.5 million USD from only 2 projects.",
    "California has the most diverse mix, with 27% of Technology and 30% of Fashion and Design projects.",
    "Pledged amounts are heavily right-skewed, with a maximum above 40 million USD.",
    "Most projects nevertheless cluster around 1 million USD.",
    "Games, Design and Technology are the most funded categories and also lead in projects and backers.",
    "Fashion is the most overfunded category relative to its goal: 32,545 USD average goal against 902,340 USD average pledged, ahead of Publishing and Design.",
    "Pledged amount correlates positively with both number of backers and goal amount.",
    "The most funded project, Surprise! Four Secret Novels by Brandon Sanderson, raised 41 million USD from 185k backers.",
];

pub fn build() -> Takeaways {
    Takeaways {
        title: "Takeaways from the analysis",
        points: POINTS,
        closing: "Plenty more insights are left in this dataset for you to explore.",
    }
}
