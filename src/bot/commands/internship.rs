//! Internship Discord commands - logging and deleting sessions, reading hour totals.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, parse_date_arg, student_label, today, truncate_message},
        core::{internship, student as student_logic},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Logs an internship session for one or more students.
    #[poise::command(slash_command, prefix_command)]
    pub async fn log_internship(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Topic practiced"] topic: String,
        #[description = "Hours credited to each participant"] hours: f64,
        #[description = "Participant phones, comma-separated"] participants: String,
        #[description = "Session date (YYYY-MM-DD), defaults to today"] date: Option<String>,
        #[description = "Where it took place"] location: Option<String>,
        #[description = "Supervising interpreter"] supervisor: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let created = internship::create_internship(
            db,
            internship::NewInternship {
                date: parse_date_arg(date.as_deref(), today())?,
                topic,
                hours,
                location,
                supervisor,
                description: None,
                participants: participants.split(',').map(str::to_string).collect(),
            },
        )
        .await?;

        let names = internship::format_participants(db, &created.participants).await?;
        ctx.say(truncate_message(&format!(
            "✅ Logged internship #{} '{}' on {} ({:.1}h)\nParticipants: {names}",
            created.internship.id,
            created.internship.topic,
            created.internship.date.format("%d/%m/%Y"),
            created.internship.hours
        )))
        .await?;
        Ok(())
    }

    /// Shows a student's internship hours per topic.
    #[poise::command(slash_command, prefix_command)]
    pub async fn internship_hours(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student"]
        #[autocomplete = "autocomplete::autocomplete_student"]
        student: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let model = student_logic::require_student(db, &student).await?;
        let by_topic = internship::hours_by_topic(db, &model.phone).await?;

        if by_topic.is_empty() {
            ctx.say(format!(
                "🎓 {} has no internship hours yet.",
                student_label(&model)
            ))
            .await?;
            return Ok(());
        }

        let total: f64 = by_topic.iter().map(|(_, hours)| hours).sum();
        let mut reply = format!(
            "🎓 **Internship hours of {}**: {total:.1}h\n",
            student_label(&model)
        );
        for (topic, hours) in &by_topic {
            writeln!(reply, "• {topic}: {hours:.1}h")?;
        }

        ctx.say(truncate_message(&reply)).await?;
        Ok(())
    }

    /// Deletes a logged internship session.
    #[poise::command(slash_command, prefix_command)]
    pub async fn delete_internship(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Internship id (shown when it was logged)"] internship_id: i64,
    ) -> Result<()> {
        internship::delete_internship(&ctx.data().database, internship_id).await?;
        ctx.say(format!("🗑️ Internship #{internship_id} deleted"))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
