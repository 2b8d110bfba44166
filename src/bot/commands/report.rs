//! Report Discord commands - overdue list, monthly billing, revenue, dashboard and export.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, today, truncate_message},
        core::{legacy, monthly, overdue, payment, report, revenue, student},
        entities::PaymentStatus,
        errors::{Error, Result},
    };
    use chrono::Datelike;
    use std::fmt::Write;

    /// Lists overdue installments grouped per student.
    #[poise::command(slash_command, prefix_command)]
    pub async fn overdue(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let rows = overdue::find_overdue_payments(db, today()).await?;

        if rows.is_empty() {
            ctx.say("🎉 No overdue payments.").await?;
            return Ok(());
        }

        let grouped = overdue::overdue_by_student(&rows);
        let total: f64 = grouped.iter().map(|g| g.total_amount).sum();
        let mut reply = format!(
            "🔴 **Overdue: {} installments, {}**\n",
            rows.len(),
            report::format_currency(total)
        );
        for g in &grouped {
            writeln!(
                reply,
                "• {} ({}) - {} installment(s), {} - oldest {}",
                g.student_name,
                student::format_phone(&g.phone),
                g.count,
                report::format_currency(g.total_amount),
                report::format_days_overdue(g.max_days_overdue)
            )?;
        }

        ctx.say(truncate_message(&reply)).await?;
        Ok(())
    }

    /// Creates the month's payment for every active student that lacks one.
    ///
    /// Without arguments this runs for the current month only if it has not
    /// been generated yet. Naming a year or month runs that period regardless.
    #[poise::command(slash_command, prefix_command)]
    pub async fn generate_month(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Year, defaults to the current year"] year: Option<i32>,
        #[description = "Month (1-12), defaults to the current month"]
        #[min = 1]
        #[max = 12]
        month: Option<u32>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let today = today();

        ctx.defer().await?;

        let result = if year.is_none() && month.is_none() {
            match monthly::process_monthly_generation(db, today).await? {
                Some(result) => result,
                None => {
                    ctx.say(format!(
                        "ℹ️ {:04}-{:02} was already generated. Pass a year and month to run it again.",
                        today.year(),
                        today.month()
                    ))
                    .await?;
                    return Ok(());
                }
            }
        } else {
            let year = year.unwrap_or_else(|| today.year());
            let month = month.unwrap_or_else(|| today.month());
            monthly::generate_payments_for_month(db, year, month).await?
        };
        let summary = monthly::format_monthly_generation_summary(&result)?;

        ctx.say(truncate_message(&format!("✅ {summary}"))).await?;
        Ok(())
    }

    /// Shows projected and collected revenue for a month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn revenue(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Year, defaults to the current year"] year: Option<i32>,
        #[description = "Month (1-12), defaults to the current month"] month: Option<u32>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let today = today();
        let year = year.unwrap_or_else(|| today.year());
        let month = month.unwrap_or_else(|| today.month());

        let students = student::get_active_students(db).await?;
        let payments = payment::get_all_payments(db).await?;
        let billed: Vec<_> = payment::get_payments_for_period(db, year, i32::try_from(month)?)
            .await?
            .into_iter()
            .filter(|p| p.status != PaymentStatus::Canceled)
            .collect();
        let billed_paid = billed
            .iter()
            .filter(|p| p.status == PaymentStatus::Paid)
            .count();

        ctx.say(format!(
            "💰 **Revenue {year:04}-{month:02}**\n\
             Projected monthly revenue (active fees): {}\n\
             Collected in the month (paid installments): {}\n\
             Billed for the month: {} installment(s), {} ({billed_paid} paid)",
            report::format_currency(revenue::projected_monthly_revenue(&students)),
            report::format_currency(revenue::collected_revenue(&payments, year, month)),
            billed.len(),
            report::format_currency(billed.iter().map(|p| p.amount).sum())
        ))
        .await?;
        Ok(())
    }

    /// Shows the school dashboard.
    #[poise::command(slash_command, prefix_command)]
    pub async fn report(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let summary = report::generate_dashboard(&data.database, today()).await?;
        let text = report::format_dashboard(&summary, &data.config.school.name)?;

        ctx.say(truncate_message(&text)).await?;
        Ok(())
    }

    /// Writes `students.csv` and `payments.csv` to the export directory.
    #[poise::command(slash_command, prefix_command)]
    pub async fn export(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let dir = &data.config.legacy.export_dir;

        ctx.defer().await?;

        std::fs::create_dir_all(dir)?;
        let students_path = dir.join("students.csv");
        let payments_path = dir.join("payments.csv");
        let students = legacy::export_students_csv(&data.database, &students_path).await?;
        let payments = legacy::export_payments_csv(&data.database, &payments_path).await?;

        ctx.say(format!(
            "📤 Exported {students} student(s) to `{}` and {payments} payment(s) to `{}`",
            students_path.display(),
            payments_path.display()
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
