//! Static course catalog, embedded at compile time
//!
//! Known goals short-circuit the outline generator. Matching is a
//! case-insensitive substring check on the learner's goal.

use lazy_static::lazy_static;
use regex::Regex;
use crate::types::Course;

lazy_static! {
    static ref MARKET_COURSE: Course = serde_json::from_str(include_str!("../../data/market_course.json"))
        .unwrap();

    static ref DATA_SCIENCE_COURSE: Course = serde_json::from_str(include_str!("../../data/data_science_course.json"))
        .unwrap();

    // =========================================================================
    // Goal keywords
    // =========================================================================
    static ref RE_MARKET: Regex = Regex::new(r"(?i)market").unwrap();
    static ref RE_DATA: Regex = Regex::new(r"(?i)data").unwrap();
    static ref RE_DATA_ROLE: Regex = Regex::new(r"(?i)(science|scientist|engineer|analy)").unwrap();
}

/// Which static course a goal maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEntry {
    Marketing,
    DataScience,
}

impl CatalogEntry {
    pub fn course(&self) -> Course {
        match self {
            CatalogEntry::Marketing => MARKET_COURSE.clone(),
            CatalogEntry::DataScience => DATA_SCIENCE_COURSE.clone(),
        }
    }
}

/// Marketing wins when both rules match
pub fn match_goal(goal: &str) -> Option<CatalogEntry> {
    if RE_MARKET.is_match(goal) {
        Some(CatalogEntry::Marketing)
    } else if RE_DATA.is_match(goal) && RE_DATA_ROLE.is_match(goal) {
        Some(CatalogEntry::DataScience)
    } else {
        None
    }
}

pub fn lookup(goal: &str) -> Option<Course> {
    match_goal(goal).map(|entry| entry.course())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_keyword() {
        assert_eq!(match_goal("Improve my MARKETING skills"), Some(CatalogEntry::Marketing));
        assert_eq!(match_goal("supermarket logistics"), Some(CatalogEntry::Marketing));
    }

    #[test]
    fn test_data_needs_role_word() {
        assert_eq!(match_goal("Become a Data Scientist"), Some(CatalogEntry::DataScience));
        assert_eq!(match_goal("data analytics"), Some(CatalogEntry::DataScience));
        assert_eq!(match_goal("data entry"), None);
        assert_eq!(match_goal("learn science"), None);
    }

    #[test]
    fn test_market_takes_priority() {
        assert_eq!(match_goal("data science for marketing"), Some(CatalogEntry::Marketing));
    }

    #[test]
    fn test_catalog_courses_are_playable() {
        for entry in [CatalogEntry::Marketing, CatalogEntry::DataScience] {
            let course = entry.course();
            let lessons: Vec<_> = course.lessons().collect();
            assert!(!lessons.is_empty());
            assert!(!lessons[0].is_locked);
            assert!(lessons[1..].iter().all(|l| l.is_locked));
            for lesson in lessons {
                let content = lesson.content.as_ref().expect("pre-baked content");
                content.validate().unwrap();
                assert!(content.has_matching(), "{} lacks a matching question", lesson.id);
            }
        }
    }

    #[test]
    fn test_catalog_layout() {
        let market = CatalogEntry::Marketing.course();
        assert_eq!(market.id, "gen-ai-content-creation");
        let sizes: Vec<usize> = market.units.iter().map(|u| u.lessons.len()).collect();
        assert_eq!(sizes, vec![2, 3, 3]);
        assert!(market.find_lesson("l3-prompts-adv").is_some());

        // One lesson per unit: every completion closes a unit
        let data = CatalogEntry::DataScience.course();
        assert_eq!(data.id, "gen-ai-data-science");
        assert_eq!(data.units.len(), 7);
        assert!(data.units.iter().all(|u| u.lessons.len() == 1));
        assert_eq!(data.units[6].id, "u7-ai-eng");
    }
}
