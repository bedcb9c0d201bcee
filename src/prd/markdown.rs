//! Markdown-to-story importer
//!
//! Converts semi-structured text into an initial story list. The format is
//! deliberately loose: numbered lines (`1. Add login`) open a story, dash
//! bullets underneath become its acceptance criteria, and everything else
//! is ignored. The importer never fails - malformed input just yields
//! fewer stories.

use crate::prd::{make_story_id, Story};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;

/// Parse free-form text into an ordered story list.
///
/// A line starting with `N. <text>` (unindented) opens a new story whose
/// `text` becomes both title and description. Ticket ids and priorities are
/// assigned from an incrementing counter starting at 1, regardless of the
/// numbers written in the document, so earlier stories default to higher
/// priority. Bullet lines (`- ...`, at any indent) attach to the story
/// currently being built as acceptance criteria; bullets before the first
/// numbered line are dropped.
pub fn import_stories(content: &str, ticket_prefix: &str) -> Vec<Story> {
    let story_line = Regex::new(r"^(\d+)\.\s+(.*)").unwrap();

    let mut stories: Vec<Story> = Vec::new();
    let mut counter: u32 = 0;

    for line in content.lines() {
        let trimmed = line.trim();

        // The story pattern anchors to the raw line: an indented numbered
        // line is a nested list item, not a new story.
        if let Some(cap) = story_line.captures(line) {
            counter += 1;
            let text = cap.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            stories.push(Story::new(
                make_story_id(ticket_prefix, counter),
                counter,
                text,
                text,
                counter,
            ));
        } else if let Some(rest) = trimmed.strip_prefix('-') {
            if let Some(current) = stories.last_mut() {
                let criterion = rest.trim();
                if !criterion.is_empty() {
                    current.acceptance_criteria.push(criterion.to_string());
                }
            }
        }
    }

    stories
}

/// Title and lead paragraph pulled out of a markdown document
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Extract the first H1 heading and the first paragraph after it.
///
/// Used to pre-fill project name and description when a backlog is imported
/// from an existing document.
pub fn extract_document_meta(content: &str) -> DocumentMeta {
    let mut meta = DocumentMeta::default();
    let mut heading_level: Option<u32> = None;
    let mut heading_text = String::new();
    let mut in_paragraph = false;
    let mut paragraph_text = String::new();

    for event in Parser::new(content) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading_level = Some(level as u32);
                heading_text.clear();
            }
            Event::Start(Tag::Paragraph) => {
                in_paragraph = true;
                paragraph_text.clear();
            }
            Event::End(TagEnd::Heading(_)) => {
                if heading_level == Some(1) && meta.title.is_none() {
                    let text = heading_text.trim();
                    if !text.is_empty() {
                        meta.title = Some(text.to_string());
                    }
                }
                heading_level = None;
            }
            Event::End(TagEnd::Paragraph) => {
                if meta.title.is_some() && meta.description.is_none() {
                    let text = paragraph_text.trim();
                    if !text.is_empty() {
                        meta.description = Some(text.to_string());
                    }
                }
                in_paragraph = false;
            }
            Event::Text(text) => {
                if heading_level.is_some() {
                    heading_text.push_str(&text);
                } else if in_paragraph {
                    paragraph_text.push_str(&text);
                }
            }
            Event::Code(code) => {
                if heading_level.is_some() {
                    heading_text.push_str(&code);
                } else if in_paragraph {
                    paragraph_text.push_str(&code);
                }
            }
            _ => {}
        }
    }

    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_two_stories_with_criteria() {
        let input = "1. Add priority field\n   - Add column\n2. Display badge\n   - Show color";
        let stories = import_stories(input, "US");

        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].id, "US-001");
        assert_eq!(stories[0].ticket_id, 1);
        assert_eq!(stories[0].title, "Add priority field");
        assert_eq!(stories[0].description, "Add priority field");
        assert_eq!(stories[0].acceptance_criteria, vec!["Add column"]);
        assert_eq!(stories[0].priority, 1);
        assert!(!stories[0].passes);

        assert_eq!(stories[1].id, "US-002");
        assert_eq!(stories[1].ticket_id, 2);
        assert_eq!(stories[1].title, "Display badge");
        assert_eq!(stories[1].acceptance_criteria, vec!["Show color"]);
        assert_eq!(stories[1].priority, 2);
        assert!(!stories[1].passes);
    }

    #[test]
    fn test_import_ignores_document_numbering() {
        // Ticket ids come from a counter, not from the numbers in the text
        let input = "7. First story\n3. Second story";
        let stories = import_stories(input, "US");

        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].ticket_id, 1);
        assert_eq!(stories[1].ticket_id, 2);
        assert_eq!(stories[0].id, "US-001");
        assert_eq!(stories[1].id, "US-002");
    }

    #[test]
    fn test_import_ignores_indented_numbered_lines() {
        // A nested ordered list is detail under its story, not new stories
        let input = "1. Parent story\n   1. nested detail step\n   - a criterion\n2. Second story";
        let stories = import_stories(input, "US");

        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].title, "Parent story");
        assert_eq!(stories[0].acceptance_criteria, vec!["a criterion"]);
        assert_eq!(stories[1].title, "Second story");
        assert_eq!(stories[1].ticket_id, 2);
        assert_eq!(stories[1].priority, 2);
    }

    #[test]
    fn test_import_drops_bullets_before_first_story() {
        let input = "- orphan bullet\n1. Real story\n- real criterion";
        let stories = import_stories(input, "US");

        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].acceptance_criteria, vec!["real criterion"]);
    }

    #[test]
    fn test_import_ignores_prose_and_headers() {
        let input = r#"# Project Plan

Some introductory prose that is not a story.

1. Build the thing
This paragraph is ignored, not attached to the description.
- Works end to end

## Notes

2. Ship the thing
"#;
        let stories = import_stories(input, "FT");

        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].title, "Build the thing");
        assert_eq!(stories[0].description, "Build the thing");
        assert_eq!(stories[0].acceptance_criteria, vec!["Works end to end"]);
        assert_eq!(stories[1].title, "Ship the thing");
        assert!(stories[1].acceptance_criteria.is_empty());
    }

    #[test]
    fn test_import_empty_input() {
        assert!(import_stories("", "US").is_empty());
        assert!(import_stories("no numbered lines here", "US").is_empty());
    }

    #[test]
    fn test_import_is_stable_across_runs() {
        let input = "1. Alpha\n- one\n2. Beta\n- two\n- three";
        let first = import_stories(input, "US");
        let second = import_stories(input, "US");

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.title, b.title);
            assert_eq!(a.description, b.description);
            assert_eq!(a.acceptance_criteria, b.acceptance_criteria);
            assert_eq!(a.priority, b.priority);
        }
    }

    #[test]
    fn test_import_fresh_stories_have_defaults() {
        let stories = import_stories("1. Only story", "US");

        assert_eq!(stories.len(), 1);
        let story = &stories[0];
        assert!(!story.passes);
        assert!(!story.blocked);
        assert!(story.depends_on.is_empty());
        assert!(story.branch.is_none());
        assert!(story.pull_request.is_none());
        assert!(story.github_issue.is_none());
        assert_eq!(story.notes, "");
    }

    #[test]
    fn test_extract_meta_title_and_description() {
        let md = "# My Project\n\nA short summary paragraph.\n\n## Details\n\nMore text.";
        let meta = extract_document_meta(md);

        assert_eq!(meta.title, Some("My Project".to_string()));
        assert_eq!(meta.description, Some("A short summary paragraph.".to_string()));
    }

    #[test]
    fn test_extract_meta_without_heading() {
        let meta = extract_document_meta("Just a paragraph, no heading.");
        assert_eq!(meta.title, None);
        assert_eq!(meta.description, None);
    }

    #[test]
    fn test_extract_meta_with_inline_code() {
        let md = "# The `ralph` Tool\n\nRuns `agent` in a loop.";
        let meta = extract_document_meta(md);

        assert_eq!(meta.title, Some("The ralph Tool".to_string()));
        assert_eq!(meta.description, Some("Runs agent in a loop.".to_string()));
    }
}
