//! Autocomplete handlers for Discord slash command parameters.
//!
//! Commands take a student's phone number; these handlers let staff type part
//! of a name instead and pick the matching student.

use crate::{
    bot::{BotData, student_label},
    core::student,
    entities::StudentModel,
    errors::Error,
};
use poise::serenity_prelude as serenity;

/// Discord's limit on autocomplete choices
const MAX_CHOICES: usize = 25;

/// Filters students whose name or phone contains `partial`, case-insensitively.
#[must_use]
pub fn match_students(students: Vec<StudentModel>, partial: &str) -> Vec<StudentModel> {
    let partial_lower = partial.trim().to_lowercase();
    let partial_digits: String = partial.chars().filter(char::is_ascii_digit).collect();

    students
        .into_iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&partial_lower)
                || (!partial_digits.is_empty() && s.phone.contains(&partial_digits))
        })
        .take(MAX_CHOICES)
        .collect()
}

/// Suggests any student, showing `Name (phone)` and submitting the phone.
pub async fn autocomplete_student(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let Ok(students) = student::get_all_students(&ctx.data().database).await else {
        return Vec::new();
    };
    to_choices(match_students(students, partial))
}

/// Suggests active students only.
pub async fn autocomplete_active_student(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let Ok(students) = student::get_active_students(&ctx.data().database).await else {
        return Vec::new();
    };
    to_choices(match_students(students, partial))
}

fn to_choices(students: Vec<StudentModel>) -> Vec<serenity::AutocompleteChoice> {
    students
        .iter()
        .map(|s| serenity::AutocompleteChoice::new(student_label(s), s.phone.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::student_model;

    #[test]
    fn test_match_students_by_name_and_phone() {
        let students = vec![
            student_model("11987654321", "Ana Souza", true),
            student_model("21912345678", "Bruno Lima", true),
        ];

        let by_name = match_students(students.clone(), "sou");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Ana Souza");

        let by_phone = match_students(students.clone(), "(21) 9123");
        assert_eq!(by_phone.len(), 1);
        assert_eq!(by_phone[0].phone, "21912345678");

        assert_eq!(match_students(students, "").len(), 2);
    }
}
