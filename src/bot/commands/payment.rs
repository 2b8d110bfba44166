//! Payment Discord commands - listing, paying, plans and removal.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, parse_date_arg, student_label, today, truncate_message},
        core::{payment, report, schedule, student as student_logic},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Lists a student's installments with their current status.
    #[poise::command(slash_command, prefix_command)]
    pub async fn payments(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student"]
        #[autocomplete = "autocomplete::autocomplete_student"]
        student: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let model = student_logic::require_student(db, &student).await?;
        let rows = payment::get_payments_for_student(db, &model.phone).await?;

        if rows.is_empty() {
            ctx.say(format!("💳 {} has no payments.", student_label(&model)))
                .await?;
            return Ok(());
        }

        let today = today();
        let mut reply = format!("💳 **Payments of {}**\n", student_label(&model));
        for p in &rows {
            let label = payment::payment_label(p, today);
            let icon = match label {
                payment::PaymentLabel::Paid => "🟢",
                payment::PaymentLabel::Pending => "⚪",
                payment::PaymentLabel::Overdue => "🔴",
                payment::PaymentLabel::Canceled => "⚫",
            };
            write!(
                reply,
                "{icon} #{} {}/{} - {} due {} - {label}",
                p.id,
                p.installment,
                p.total_installments,
                report::format_currency(p.amount),
                p.due_date.format("%d/%m/%Y")
            )?;
            if let Some(paid_on) = p.payment_date {
                write!(reply, " on {}", paid_on.format("%d/%m/%Y"))?;
            }
            if let Some(method) = &p.payment_method {
                write!(reply, " ({method})")?;
            }
            reply.push('\n');
        }

        ctx.say(truncate_message(&reply)).await?;
        Ok(())
    }

    /// Marks an installment as paid.
    #[poise::command(slash_command, prefix_command)]
    pub async fn pay(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Payment id (see /payments)"] payment_id: i64,
        #[description = "Payment method, e.g. pix, cash, card"] method: Option<String>,
        #[description = "Payment date (YYYY-MM-DD), defaults to today"] date: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let paid_on = parse_date_arg(date.as_deref(), today())?;

        let updated = payment::mark_payment_paid(db, payment_id, paid_on, method).await?;

        ctx.say(format!(
            "✅ Payment #{} of {} ({}/{}) marked as paid on {}",
            updated.id,
            report::format_currency(updated.amount),
            updated.month,
            updated.year,
            paid_on.format("%d/%m/%Y")
        ))
        .await?;
        Ok(())
    }

    /// Writes off a pending installment.
    #[poise::command(slash_command, prefix_command)]
    pub async fn cancel_payment(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Payment id (see /payments)"] payment_id: i64,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let updated = payment::cancel_payment(db, payment_id).await?;

        ctx.say(format!(
            "✅ Payment #{} ({}/{}) canceled",
            updated.id, updated.month, updated.year
        ))
        .await?;
        Ok(())
    }

    /// Adds a payment plan to an existing student, e.g. after a renewal.
    #[poise::command(slash_command, prefix_command)]
    pub async fn plan(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student"]
        #[autocomplete = "autocomplete::autocomplete_active_student"]
        student: String,
        #[description = "Number of monthly installments (1-120)"]
        #[min = 1]
        #[max = 120]
        installments: i32,
        #[description = "Plan start date (YYYY-MM-DD), defaults to today"] start: Option<String>,
        #[description = "Amount per installment, defaults to the student's fee"] amount: Option<f64>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let model = student_logic::require_student(db, &student).await?;

        let outcome = payment::create_payment_plan(
            db,
            &schedule::ScheduleRequest {
                phone: model.phone.clone(),
                monthly_fee: amount.unwrap_or(model.monthly_fee),
                enrollment_date: parse_date_arg(start.as_deref(), today())?,
                installments,
                end_date: None,
                due_day: model.payment_day,
            },
        )
        .await?;

        let mut reply = format!(
            "✅ Plan for {}: {} installment(s) created",
            student_label(&model),
            outcome.created.len()
        );
        if outcome.skipped > 0 {
            write!(reply, ", {} month(s) already billed", outcome.skipped)?;
        }
        if let (Some(first), Some(last)) = (outcome.created.first(), outcome.created.last()) {
            write!(
                reply,
                "\nFirst due {}, last due {}",
                first.due_date.format("%d/%m/%Y"),
                last.due_date.format("%d/%m/%Y")
            )?;
        }

        ctx.say(reply).await?;
        Ok(())
    }

    /// Permanently deletes a single installment.
    #[poise::command(slash_command, prefix_command)]
    pub async fn delete_payment(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Payment id (see /payments)"] payment_id: i64,
    ) -> Result<()> {
        payment::delete_payment(&ctx.data().database, payment_id).await?;
        ctx.say(format!("🗑️ Payment #{payment_id} deleted")).await?;
        Ok(())
    }

    /// Permanently deletes every installment of a student.
    #[poise::command(slash_command, prefix_command)]
    pub async fn clear_payments(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student"]
        #[autocomplete = "autocomplete::autocomplete_student"]
        student: String,
        #[description = "Set to true to confirm the deletion"] confirm: bool,
    ) -> Result<()> {
        if !confirm {
            ctx.say("ℹ️ Deletion not confirmed. Run again with `confirm: true`.")
                .await?;
            return Ok(());
        }

        let db = &ctx.data().database;
        let model = student_logic::require_student(db, &student).await?;
        let removed = payment::delete_student_payments(db, &model.phone).await?;

        ctx.say(format!(
            "🗑️ Deleted {removed} payment(s) of {}",
            student_label(&model)
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
