//! crates/course_core/src/prompts.rs
//!
//! Prompt templates for each generation kind. Placeholders in `{braces}` are
//! substituted verbatim; every template asks for a single JSON object.

const ROADMAP_TEMPLATE: &str = r#"You are an expert curriculum designer.

Create a learning roadmap for the topic: "{topic}".

Respond with a single JSON object of this exact shape:
{
  "title": "A concise, engaging course title",
  "roadmap": [
    { "title": "Module title", "description": "One or two sentences describing what the module covers." }
  ]
}

Rules:
- Between 5 and 10 modules, ordered from fundamentals to advanced material.
- Every module title must be unique.
- Respond ONLY with JSON, no explanation."#;

const MODULE_DETAIL_TEMPLATE: &str = r#"You are an expert teacher writing study material.

Write the lesson for the module "{title}".
Module description: {description}

Respond with a single JSON object of this exact shape:
{
  "title": "{title}",
  "detailedNotes": ["Paragraph one.", "Paragraph two."],
  "deepDiveTopics": ["A follow-up sub-topic worth exploring"],
  "flashcards": [{ "front": "Question or term", "back": "Answer or definition" }]
}

Rules:
- "detailedNotes" holds 4 to 8 clear explanatory paragraphs.
- Provide 3 to 5 deep dive topics and 5 to 10 flashcards.
- Respond ONLY with JSON, no explanation."#;

const DEEP_DIVE_TEMPLATE: &str = r#"You are an expert teacher.

A student is reading the following material:
---
{original_text}
---

Explain the sub-topic "{sub_topic}" in more depth than the material does, with
concrete examples. Keep it focused and under 400 words.

Respond with a single JSON object of this exact shape:
{ "deeperExplanation": "The explanation text." }

Respond ONLY with JSON, no explanation."#;

const QUIZ_TEMPLATE: &str = r#"You are an expert examiner.

Write a multiple-choice quiz with exactly {question_count} questions about: "{lesson_topic}".

Respond with a single JSON object of this exact shape:
{
  "questions": [
    {
      "question": "The question text",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctAnswer": "The text of the correct option",
      "explanation": "Why the answer is correct"
    }
  ]
}

Respond ONLY with JSON, no explanation."#;

const SEARCH_ANSWER_TEMPLATE: &str = r#"You are a helpful tutor answering a student's question about their lesson.

LESSON NOTES:
---
{context_notes}
---

QUESTION:
{user_question}

Answer using the lesson notes first; you may add general knowledge when the notes
do not cover the question. Keep the answer clear and concise.

Respond with a single JSON object of this exact shape:
{ "answer": "The answer text." }

Respond ONLY with JSON, no explanation."#;

pub fn roadmap(topic: &str) -> String {
    ROADMAP_TEMPLATE.replace("{topic}", topic)
}

pub fn module_detail(title: &str, description: &str) -> String {
    MODULE_DETAIL_TEMPLATE
        .replace("{title}", title)
        .replace("{description}", description)
}

pub fn deep_dive(original_text: &str, sub_topic: &str) -> String {
    DEEP_DIVE_TEMPLATE
        .replace("{original_text}", original_text)
        .replace("{sub_topic}", sub_topic)
}

pub fn quiz(lesson_topic: &str, question_count: u32) -> String {
    QUIZ_TEMPLATE
        .replace("{question_count}", &question_count.to_string())
        .replace("{lesson_topic}", lesson_topic)
}

pub fn search_answer(context_notes: &str, user_question: &str) -> String {
    SEARCH_ANSWER_TEMPLATE
        .replace("{context_notes}", context_notes)
        .replace("{user_question}", user_question)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_substitute_every_placeholder() {
        let prompts = [
            roadmap("Rust"),
            module_detail("Ownership", "Moves and borrows"),
            deep_dive("Some notes", "Lifetimes"),
            quiz("Traits", 5),
            search_answer("Notes", "Why?"),
        ];

        for prompt in prompts {
            for placeholder in [
                "{topic}",
                "{title}",
                "{description}",
                "{original_text}",
                "{sub_topic}",
                "{question_count}",
                "{lesson_topic}",
                "{context_notes}",
                "{user_question}",
            ] {
                assert!(!prompt.contains(placeholder), "{placeholder} left in prompt");
            }
        }
    }

    #[test]
    fn quiz_prompt_carries_count() {
        assert!(quiz("Traits", 7).contains("exactly 7 questions"));
    }
}
