use validator::ValidationError;
use zxcvbn::zxcvbn;

const MAX_LENGTH: usize = 128;
const MIN_SCORE: u8 = 3;

/// Rejects passwords that zxcvbn rates below "safely unguessable".
/// Length bounds are checked by the `length` validator on the field.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_LENGTH {
        let mut error = ValidationError::new("password_length");
        error.message = Some(format!("Must be at most {} characters", MAX_LENGTH).into());
        return Err(error);
    }

    let estimate = zxcvbn(password, &[]);
    if estimate.score() as u8 >= MIN_SCORE {
        return Ok(());
    }

    let feedback = estimate
        .feedback()
        .and_then(|f| f.warning().map(|w| w.to_string()))
        .unwrap_or_else(|| "Password is too easy to guess".to_string());

    let mut error = ValidationError::new("password_strength");
    error.message = Some(feedback.into());
    Err(error)
}
