//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted answer sentence, in characters.
pub const MAX_ANSWER_LENGTH: usize = 32;

/// Rejects strings made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Validates every answer sentence: non-blank and at most [`MAX_ANSWER_LENGTH`] characters.
pub fn validate_answer_texts(answers: &[String]) -> Result<(), ValidationError> {
    for (index, answer) in answers.iter().enumerate() {
        if answer.trim().is_empty() {
            let mut err = ValidationError::new("answer_blank");
            err.message = Some(format!("answer {} must not be blank", index + 1).into());
            return Err(err);
        }

        let length = answer.chars().count();
        if length > MAX_ANSWER_LENGTH {
            let mut err = ValidationError::new("answer_length");
            err.message = Some(
                format!(
                    "answer {} exceeds {MAX_ANSWER_LENGTH} characters (got {length})",
                    index + 1
                )
                .into(),
            );
            return Err(err);
        }
    }
    Ok(())
}
