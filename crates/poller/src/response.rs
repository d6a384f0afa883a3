//! Validation of API responses and formatting of status messages.

use serde_json::Value;

use homework_common::error::BotError;
use homework_common::types::HomeworkStatus;

/// Extract the `homeworks` list from an API response.
///
/// The list is returned as-is: the server's order is kept and an empty list
/// is a valid answer.
pub fn check_response(response: &Value) -> Result<&[Value], BotError> {
    tracing::debug!("Validating API response");

    let homeworks = response
        .get("homeworks")
        .ok_or_else(|| BotError::incorrect_response("не найден ключ \"homeworks\""))?;

    let homeworks = homeworks
        .as_array()
        .ok_or_else(|| BotError::incorrect_response("значение \"homeworks\" не является списком"))?;

    tracing::debug!(count = homeworks.len(), "Homeworks in API response");
    Ok(homeworks.as_slice())
}

/// Build the notification text for a single homework record.
pub fn parse_status(homework: &Value) -> Result<String, BotError> {
    tracing::debug!("Parsing homework status");

    let name = string_field(homework, "homework_name")?;
    let code = string_field(homework, "status")?;

    let status = HomeworkStatus::from_code(code).ok_or_else(|| {
        BotError::incorrect_response(format!("неизвестный статус работы \"{code}\""))
    })?;

    Ok(format!(
        "Изменился статус проверки работы \"{name}\". {}",
        status.verdict()
    ))
}

/// Server-reported timestamp of the response, if present and integral.
pub fn current_date(response: &Value) -> Option<i64> {
    response.get("current_date").and_then(Value::as_i64)
}

fn string_field<'a>(homework: &'a Value, key: &str) -> Result<&'a str, BotError> {
    match homework.get(key) {
        Some(Value::String(value)) => Ok(value.as_str()),
        Some(_) => Err(BotError::incorrect_response(format!(
            "ключ \"{key}\" не является строкой"
        ))),
        None => Err(BotError::incorrect_response(format!(
            "не найден ключ \"{key}\""
        ))),
    }
}
