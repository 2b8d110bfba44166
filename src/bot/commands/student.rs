//! Student Discord commands - enrollment, lookup, listing and cancellation.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, parse_date_arg, student_label, today, truncate_message},
        core::{internship, payment, report, student as student_logic},
        entities::StudentStatus,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Enrolls a new student and creates their payment plan.
    #[poise::command(slash_command, prefix_command)]
    #[allow(clippy::too_many_arguments)]
    pub async fn enroll(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Phone number, e.g. (11) 98765-4321"] phone: String,
        #[description = "Full name"] name: String,
        #[description = "Monthly fee"] monthly_fee: f64,
        #[description = "Due day of month (1-28)"] due_day: Option<i32>,
        #[description = "Number of monthly installments (1-120)"]
        #[min = 1]
        #[max = 120]
        installments: Option<i32>,
        #[description = "Enrollment date (YYYY-MM-DD), defaults to today"] date: Option<String>,
        #[description = "Course name"] course: Option<String>,
        #[description = "Contact e-mail"] email: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let billing = &data.config.billing;
        let enrollment_date = parse_date_arg(date.as_deref(), today())?;

        let mut new_student = student_logic::NewStudent::new(
            phone,
            name,
            enrollment_date,
            monthly_fee,
            due_day.unwrap_or(i32::try_from(billing.default_due_day)?),
            installments.unwrap_or(i32::try_from(billing.default_installments)?),
        );
        new_student.course_type = course;
        new_student.email = email;

        let (model, payments) = student_logic::enroll_student(&data.database, new_student).await?;

        let mut reply = format!(
            "✅ Enrolled {} with {} installments of {}",
            student_label(&model),
            payments.len(),
            report::format_currency(model.monthly_fee)
        );
        if let (Some(first), Some(last)) = (payments.first(), payments.last()) {
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

    /// Shows a student's details, payments and internship hours.
    #[poise::command(slash_command, prefix_command)]
    pub async fn student(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student"]
        #[autocomplete = "autocomplete::autocomplete_student"]
        student: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let model = student_logic::require_student(db, &student).await?;
        let payments = payment::get_payments_for_student(db, &model.phone).await?;
        let hours = internship::student_internship_hours(db, &model.phone).await?;
        let today = today();

        let mut reply = format!("👤 **{}**\n", student_label(&model));
        writeln!(
            reply,
            "Status: {} | Enrolled {} | Fee {} due on day {}",
            model.status,
            model.enrollment_date.format("%d/%m/%Y"),
            report::format_currency(model.monthly_fee),
            model.payment_day
        )?;
        if let Some(course) = &model.course_type {
            writeln!(reply, "Course: {course}")?;
        }
        if let Some(email) = &model.email {
            writeln!(reply, "E-mail: {email}")?;
        }
        if let Some(canceled) = model.cancellation_date {
            writeln!(
                reply,
                "Canceled on {} (fee paid: {})",
                canceled.format("%d/%m/%Y"),
                if model.cancellation_fee_paid { "yes" } else { "no" }
            )?;
        }

        let overdue: Vec<_> = payments
            .iter()
            .filter(|p| payment::is_overdue(p, today))
            .collect();
        let paid = payments
            .iter()
            .filter(|p| p.status == crate::entities::PaymentStatus::Paid)
            .count();
        writeln!(
            reply,
            "Payments: {} total, {paid} paid, {} overdue ({})",
            payments.len(),
            overdue.len(),
            report::format_currency(overdue.iter().map(|p| p.amount).sum())
        )?;
        writeln!(reply, "Internship hours: {hours:.1}")?;

        ctx.say(truncate_message(&reply)).await?;
        Ok(())
    }

    /// Lists students, active ones by default.
    #[poise::command(slash_command, prefix_command)]
    pub async fn students(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "active, canceled or all"] status: Option<String>,
        #[description = "Only names containing this text"] search: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let filter = match status.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("active") => Some(StudentStatus::Active),
            Some("canceled") => Some(StudentStatus::Canceled),
            Some("all") => None,
            Some(other) => {
                ctx.say(format!(
                    "❌ Unknown status '{other}'. Use active, canceled or all."
                ))
                .await?;
                return Ok(());
            }
        };

        let all = match search.as_deref() {
            Some(partial) => student_logic::search_students_by_name(db, partial).await?,
            None => student_logic::get_all_students(db).await?,
        };
        let listed: Vec<_> = all
            .into_iter()
            .filter(|s| filter.is_none_or(|f| s.status == f))
            .collect();

        if listed.is_empty() {
            ctx.say("📋 No students found.").await?;
            return Ok(());
        }

        let mut reply = format!("📋 **Students ({})**\n", listed.len());
        for s in &listed {
            writeln!(
                reply,
                "• {} - {} - {}",
                student_label(s),
                report::format_currency(s.monthly_fee),
                s.status
            )?;
        }

        ctx.say(truncate_message(&reply)).await?;
        Ok(())
    }

    /// Cancels a student's enrollment.
    #[poise::command(slash_command, prefix_command)]
    pub async fn cancel_student(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student"]
        #[autocomplete = "autocomplete::autocomplete_active_student"]
        student: String,
        #[description = "Whether the cancellation fee was paid"] fee_paid: Option<bool>,
        #[description = "Cancellation date (YYYY-MM-DD), defaults to today"] date: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let cancellation_date = parse_date_arg(date.as_deref(), today())?;

        let model = student_logic::cancel_student(
            db,
            &student,
            cancellation_date,
            fee_paid.unwrap_or(false),
        )
        .await?;

        ctx.say(format!(
            "✅ Canceled enrollment of {} on {}",
            student_label(&model),
            cancellation_date.format("%d/%m/%Y")
        ))
        .await?;
        Ok(())
    }

    /// Edits a student's details. Fee and due day changes apply to future payments.
    #[poise::command(slash_command, prefix_command)]
    #[allow(clippy::too_many_arguments)]
    pub async fn edit_student(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Student"]
        #[autocomplete = "autocomplete::autocomplete_student"]
        student: String,
        #[description = "New full name"] name: Option<String>,
        #[description = "New monthly fee"] monthly_fee: Option<f64>,
        #[description = "New due day of month (1-28)"] due_day: Option<i32>,
        #[description = "New course name"] course: Option<String>,
        #[description = "New contact e-mail"] email: Option<String>,
        #[description = "New address"] address: Option<String>,
        #[description = "Staff notes"] comments: Option<String>,
    ) -> Result<()> {
        let update = student_logic::StudentUpdate {
            name,
            email,
            address,
            course_type: course,
            comments,
            monthly_fee,
            payment_day: due_day,
        };
        if update == student_logic::StudentUpdate::default() {
            ctx.say("ℹ️ Nothing to change.").await?;
            return Ok(());
        }

        let model =
            student_logic::update_student_details(&ctx.data().database, &student, update).await?;

        ctx.say(format!(
            "✅ Updated {} - fee {} due on day {}",
            student_label(&model),
            report::format_currency(model.monthly_fee),
            model.payment_day
        ))
        .await?;
        Ok(())
    }

    /// Permanently deletes a student with their payments and internship participation.
    #[poise::command(slash_command, prefix_command)]
    pub async fn delete_student(
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
        let removed = student_logic::delete_student(db, &model.phone).await?;

        ctx.say(format!(
            "🗑️ Deleted {} and {removed} payment(s)",
            student_label(&model)
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
