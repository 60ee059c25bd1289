use std::fmt::Write;

use coursekit_llm::Message;

use crate::request::{Subject, TutorRequest};
use crate::topics::chapter_title;

const MATH_TUTOR: &str = "You are a patient, encouraging math tutor for a quantitative literacy course. \
The student has ADHD and struggles with executive function. Break problems into small numbered steps, \
use simple non-judgmental language, give a concrete real-world example, point out common mistakes, \
and close with a short study tip. Keep the answer under 500 words.";

const WRITING_COACH: &str = "You are a supportive writing coach for a first-year college writing course. \
The student has ADHD and needs extra structure. Break the writing task into manageable chunks, \
give clear organizational strategies and specific actionable feedback, and build confidence. \
Keep the answer under 500 words.";

/// System and user messages for one tutoring request. `formulas` are quoted
/// from the knowledge base so answers match the course notation.
#[must_use]
pub fn build(subject: Subject, request: &TutorRequest, formulas: &[String]) -> Vec<Message> {
    let system = match subject {
        Subject::Writing => WRITING_COACH,
        Subject::Math | Subject::General => MATH_TUTOR,
    };

    let mut user = String::new();
    if let Some(chapter) = request.chapter.as_deref() {
        match chapter_title(chapter) {
            Some(title) => {
                let _ = writeln!(user, "The student is working on Chapter {chapter}: {title}.");
            }
            None => {
                let _ = writeln!(user, "The student is working on Chapter {chapter}.");
            }
        }
    }
    if let Some(context) = request.context.as_deref().filter(|c| !c.trim().is_empty()) {
        let _ = writeln!(user, "Context: {context}");
    }
    if !formulas.is_empty() {
        user.push_str("Formulas from the course notes:\n");
        for formula in formulas {
            let _ = writeln!(user, "- {formula}");
        }
    }
    if !user.is_empty() {
        user.push('\n');
    }
    let _ = write!(user, "Student question: {}", request.question.trim());

    vec![Message::system(system), Message::user(user)]
}

#[cfg(test)]
mod tests {
    use coursekit_llm::Role;

    use super::*;

    #[test]
    fn math_prompt_includes_chapter_and_formulas() {
        let request = TutorRequest::new("What is APY?")
            .with_chapter("6")
            .with_context("math-tutorial");
        let messages = build(Subject::Math, &request, &["I = Prt".to_owned()]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("math tutor"));
        let user = &messages[1].content;
        assert!(user.contains("Chapter 6: Personal Finance"));
        assert!(user.contains("- I = Prt"));
        assert!(user.ends_with("Student question: What is APY?"));
    }

    #[test]
    fn writing_prompt_uses_coach() {
        let messages = build(Subject::Writing, &TutorRequest::new("thesis?"), &[]);
        assert!(messages[0].content.contains("writing coach"));
        assert_eq!(messages[1].content, "Student question: thesis?");
    }

    #[test]
    fn unknown_chapter_is_still_named() {
        let request = TutorRequest::new("q").with_chapter("2");
        let messages = build(Subject::Math, &request, &[]);
        assert!(messages[1].content.starts_with("The student is working on Chapter 2.\n"));
    }
}
