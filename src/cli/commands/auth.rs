use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{load_image, output_success, report_client_error, value_or_prompt};
use crate::cli::CliContext;
use crate::layout::LayoutShell;
use crate::pages::auth::{AdminLoginPage, LoginPage, RegisterPage};
use crate::routing::Navigation;
use crate::types::Role;
use crate::validation::{LoginForm, RegistrationForm};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login and store the session")]
    Login {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
        #[arg(long, help = "Use the admin login, which refuses other roles")]
        admin: bool,
    },

    #[command(about = "Register a Patient or Doctor account")]
    Register {
        #[arg(long, help = "Full name")]
        name: String,
        #[arg(long, help = "Email address")]
        email: String,
        #[arg(long, default_value = "Patient", help = "Patient or Doctor")]
        role: Role,
        #[arg(long, help = "Profile image (JPG/PNG/GIF, up to 5MB)")]
        image: PathBuf,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
        #[arg(long, help = "Password confirmation (will prompt if not provided)")]
        confirm_password: Option<String>,
    },

    #[command(about = "Clear the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show current user information")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let output_format = &ctx.output_format;
    match cmd {
        AuthCommands::Login { email, password, admin } => {
            let password = value_or_prompt(password, "Password: ")?;
            let form = LoginForm::new(email, password);
            let submitted = if admin {
                AdminLoginPage.submit(&ctx.api, &form).await
            } else {
                LoginPage.submit(&ctx.api, &form).await
            };
            match submitted {
                Ok(navigation) => {
                    let session = ctx
                        .session
                        .current()
                        .ok_or_else(|| anyhow::anyhow!("Session was not stored"))?;
                    output_success(
                        output_format,
                        &format!("Logged in as {} ({})", session.display_name(), session.role()),
                        Some(json!({ "role": session.role(), "redirect": redirect_target(&navigation) })),
                    )
                }
                Err(e) => report_client_error(output_format, e),
            }
        }
        AuthCommands::Register {
            name,
            email,
            role,
            image,
            password,
            confirm_password,
        } => {
            let password = value_or_prompt(password, "Password: ")?;
            let confirm_password = value_or_prompt(confirm_password, "Confirm password: ")?;
            let form = RegistrationForm {
                name,
                email,
                password,
                confirm_password,
                role,
                image: Some(load_image(&image)?),
            };
            match RegisterPage.submit(&ctx.api, &form).await {
                Ok(navigation) => output_success(
                    output_format,
                    "Registration successful. Please log in.",
                    Some(json!({ "email": form.email.trim(), "role": form.role, "redirect": redirect_target(&navigation) })),
                ),
                Err(e) => report_client_error(output_format, e),
            }
        }
        AuthCommands::Logout => {
            match ctx.session.current() {
                Some(session) => {
                    LayoutShell::for_role(session.role()).logout(&ctx.session)?;
                }
                None => ctx.session.clear()?,
            }
            output_success(output_format, "Logged out", None)
        }
        AuthCommands::Status => match ctx.session.current() {
            Some(session) => output_success(
                output_format,
                &format!("Logged in as {} ({})", session.display_name(), session.role()),
                Some(json!({ "authenticated": true, "role": session.role(), "home": session.role().home_path() })),
            ),
            None => output_success(
                output_format,
                "Not logged in",
                Some(json!({ "authenticated": false })),
            ),
        },
        AuthCommands::Whoami => {
            let session = ctx
                .session
                .current()
                .ok_or_else(|| anyhow::anyhow!("Not logged in"))?;
            output_success(
                output_format,
                &format!("{} <{}> ({})", session.display_name(), session.user.email, session.role()),
                Some(json!({ "user": session.user })),
            )
        }
    }
}

fn redirect_target(navigation: &Navigation) -> Option<&str> {
    match navigation {
        Navigation::Redirect { to, .. } => Some(to.as_str()),
        Navigation::Render { .. } => None,
    }
}
