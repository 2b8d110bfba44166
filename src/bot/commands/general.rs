//! General Discord commands - ping and help.
//! This module contains simple commands that don't require database operations
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let school = &ctx.data().config.school.name;
        let help_text = format!(
            "**{school} Help**\n\
        Here is a summary of all available commands.\n\n\
        **Students**\n\
        • `/enroll <phone> <name> <fee> [due_day] [installments] [date]` - Enrolls a student and creates the payment plan.\n\
        • `/student <student>` - Shows a student's details, payments and internship hours.\n\
        • `/students [status]` - Lists students.\n\
        • `/cancel_student <student> [fee_paid] [date]` - Cancels an enrollment.\n\
        • `/edit_student <student> [name] [monthly_fee] [due_day] ...` - Edits a student's details.\n\
        • `/delete_student <student> <confirm>` - Deletes a student and their records.\n\n\
        **Payments**\n\
        • `/payments <student>` - Lists a student's installments.\n\
        • `/pay <payment_id> [method] [date]` - Marks an installment as paid.\n\
        • `/cancel_payment <payment_id>` - Writes off an installment.\n\
        • `/plan <student> <installments> [start] [amount]` - Adds a payment plan.\n\
        • `/delete_payment <payment_id>` - Deletes an installment.\n\
        • `/clear_payments <student> <confirm>` - Deletes all of a student's installments.\n\
        • `/overdue` - Lists overdue installments per student.\n\
        • `/generate_month [year] [month]` - Bills every active student for a month.\n\n\
        **Internships**\n\
        • `/log_internship <topic> <hours> <participants> [date]` - Logs a session.\n\
        • `/internship_hours <student>` - Shows a student's hours per topic.\n\
        • `/delete_internship <internship_id>` - Deletes a logged session.\n\n\
        **Reports**\n\
        • `/revenue [year] [month]` - Projected and collected revenue.\n\
        • `/report` - School dashboard.\n\
        • `/export` - Writes students and payments to CSV.\n\
        • `/ping` - Checks if the bot is responsive."
        );

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
