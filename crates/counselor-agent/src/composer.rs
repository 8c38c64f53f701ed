//! Turn composer — builds the user turn that goes into the history.

use counselor_core::{ChatError, Turn};

/// Compose the user turn for a query, optionally grounded in a document.
///
/// With non-empty extracted text the turn embeds the document first, then the
/// question, then a fixed instruction to answer as the counselor. Otherwise
/// the query is used verbatim.
pub fn compose_user_turn(query: &str, extracted: Option<&str>) -> Result<Turn, ChatError> {
    let document = extracted.filter(|text| !text.trim().is_empty());

    match document {
        Some(doc) => Ok(Turn::user(format!(
            "Based on the following document content:\n\n{doc}\n\n\
             User Question: {query}\n\n\
             Provide a compassionate, therapeutic response that incorporates insights \
             from the document while maintaining your role as a counselor."
        ))),
        None if query.trim().is_empty() => Err(ChatError::EmptyQuery),
        None => Ok(Turn::user(query)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counselor_core::Role;

    #[test]
    fn test_plain_query_verbatim() {
        let turn = compose_user_turn("I can't focus on my studies", None).unwrap();
        assert_eq!(turn.role(), Role::User);
        assert_eq!(turn.text(), "I can't focus on my studies");
    }

    #[test]
    fn test_document_turn_layout() {
        let turn = compose_user_turn("What does this mean?", Some("TSH: 8.45")).unwrap();
        let text = turn.text();

        let doc_at = text.find("TSH: 8.45").unwrap();
        let question_at = text.find("User Question: What does this mean?").unwrap();
        let instruction_at = text.find("maintaining your role as a counselor").unwrap();
        assert!(text.starts_with("Based on the following document content:"));
        assert!(doc_at < question_at && question_at < instruction_at);
    }

    #[test]
    fn test_blank_extraction_falls_back_to_query() {
        let turn = compose_user_turn("hello", Some("  \n ")).unwrap();
        assert_eq!(turn.text(), "hello");
    }

    #[test]
    fn test_empty_query_and_no_document() {
        assert!(matches!(compose_user_turn("   ", None), Err(ChatError::EmptyQuery)));
        assert!(matches!(compose_user_turn("", Some("")), Err(ChatError::EmptyQuery)));
    }

    #[test]
    fn test_only_document_is_ok() {
        let turn = compose_user_turn("", Some("Vitamin D: low")).unwrap();
        assert!(turn.text().contains("Vitamin D: low"));
    }
}
