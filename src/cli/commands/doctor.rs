use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;

use crate::api::models::DoctorProfileUpdate;
use crate::cli::utils::{load_image, output_page, output_success, report_client_error};
use crate::cli::CliContext;
use crate::pages::availability::{parse_weekday, weekday_key, DoctorAvailabilityPage};
use crate::pages::doctor::{DoctorAppointmentsPage, DoctorDashboardPage, DoctorProfilePage};
use crate::pages::Page;
use crate::types::{AppointmentStatus, RecordId};

#[derive(Subcommand)]
pub enum DoctorCommands {
    #[command(about = "Your name and appointment totals")]
    Dashboard,

    #[command(about = "Your appointments")]
    Appointments {
        #[command(subcommand)]
        cmd: AppointmentCommands,
    },

    #[command(about = "Your weekly availability")]
    Availability {
        #[command(subcommand)]
        cmd: AvailabilityCommands,
    },

    #[command(about = "Your profile")]
    Profile {
        #[command(subcommand)]
        cmd: ProfileCommands,
    },
}

#[derive(Subcommand)]
pub enum AppointmentCommands {
    #[command(about = "List appointments")]
    List,

    #[command(about = "Change an appointment's status")]
    Status {
        #[arg(help = "Appointment id")]
        id: RecordId,
        #[arg(help = "pending, confirmed, completed or cancelled")]
        status: AppointmentStatus,
    },

    #[command(about = "Add a note to an appointment")]
    Note {
        #[arg(help = "Appointment id")]
        id: RecordId,
        #[arg(help = "Note text")]
        note: String,
    },
}

#[derive(Subcommand)]
pub enum AvailabilityCommands {
    #[command(about = "Show the week")]
    Show,

    #[command(about = "Add a HH:MM-HH:MM slot to a day and save")]
    Add {
        #[arg(help = "Weekday, e.g. monday")]
        day: String,
        #[arg(help = "Slot, e.g. 09:00-10:00")]
        slot: String,
    },

    #[command(about = "Change the slot at an index and save")]
    Edit {
        #[arg(help = "Weekday, e.g. monday")]
        day: String,
        #[arg(help = "Zero-based slot index")]
        index: usize,
        #[arg(help = "Slot, e.g. 09:00-10:00")]
        slot: String,
    },

    #[command(about = "Remove the slot at an index and save")]
    Remove {
        #[arg(help = "Weekday, e.g. monday")]
        day: String,
        #[arg(help = "Zero-based slot index")]
        index: usize,
    },

    #[command(about = "Delete every slot of a day")]
    DeleteDay {
        #[arg(help = "Weekday, e.g. monday")]
        day: String,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    #[command(about = "Show your profile")]
    Show,

    #[command(about = "Update name, specialty, experience, bio or image")]
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        specialty: Option<String>,
        #[arg(long, help = "Years in practice")]
        experience: Option<u32>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long, help = "New profile image (JPG/PNG/GIF, up to 5MB)")]
        image: Option<PathBuf>,
    },
}

pub async fn handle(cmd: DoctorCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let output_format = &ctx.output_format;
    match cmd {
        DoctorCommands::Dashboard => {
            let path = "/doctor/dashboard";
            let session = ctx.enter(path)?;
            let mut page = DoctorDashboardPage::default();
            page.mount(&ctx.api).await;
            output_page(output_format, path, Some(&session), &page)
        }
        DoctorCommands::Appointments { cmd } => {
            let path = "/doctor/appointments";
            let session = ctx.enter(path)?;
            let mut page = DoctorAppointmentsPage::default();
            let result = match cmd {
                AppointmentCommands::List => {
                    page.mount(&ctx.api).await;
                    return output_page(output_format, path, Some(&session), &page);
                }
                AppointmentCommands::Status { id, status } => page
                    .set_status(&ctx.api, &id, status)
                    .await
                    .map(|_| (format!("Appointment {} is now {}", id, status), json!({ "id": id, "status": status }))),
                AppointmentCommands::Note { id, note } => page
                    .add_note(&ctx.api, &id, &note)
                    .await
                    .map(|_| (format!("Note added to appointment {}", id), json!({ "id": id }))),
            };
            match result {
                Ok((message, data)) => output_success(output_format, &message, Some(data)),
                Err(e) => report_client_error(output_format, e),
            }
        }
        DoctorCommands::Availability { cmd } => {
            let path = "/doctor/availability";
            let session = ctx.enter(path)?;
            let mut page = DoctorAvailabilityPage::default();
            page.mount(&ctx.api).await;
            if let Some(error) = page.error() {
                return Err(anyhow::anyhow!("{}", error));
            }

            let result = match cmd {
                AvailabilityCommands::Show => {
                    return output_page(output_format, path, Some(&session), &page);
                }
                AvailabilityCommands::Add { day, slot } => {
                    let day = parse_weekday(&day)?;
                    let editor = page.editor_mut();
                    let index = editor.add_slot(day);
                    editor.set_slot(day, index, &slot)?;
                    page.save(&ctx.api).await.map(|_| format!("Added {} to {}", slot.trim(), weekday_key(day)))
                }
                AvailabilityCommands::Edit { day, index, slot } => {
                    let day = parse_weekday(&day)?;
                    page.editor_mut().set_slot(day, index, &slot)?;
                    page.save(&ctx.api).await.map(|_| format!("Updated {} slot {}", weekday_key(day), index))
                }
                AvailabilityCommands::Remove { day, index } => {
                    let day = parse_weekday(&day)?;
                    let removed = page.editor_mut().remove_slot(day, index)?;
                    page.save(&ctx.api).await.map(|_| format!("Removed {} from {}", removed, weekday_key(day)))
                }
                AvailabilityCommands::DeleteDay { day } => {
                    let day = parse_weekday(&day)?;
                    let confirm = ctx.confirm();
                    page.delete_day(&ctx.api, day, confirm.as_ref())
                        .await
                        .map(|_| format!("Deleted availability for {}", weekday_key(day)))
                }
            };
            match result {
                Ok(message) => output_success(output_format, &message, Some(page.to_json())),
                Err(e) => report_client_error(output_format, e),
            }
        }
        DoctorCommands::Profile { cmd } => {
            let path = "/doctor/profile";
            let session = ctx.enter(path)?;
            let mut page = DoctorProfilePage::default();
            match cmd {
                ProfileCommands::Show => {
                    page.mount(&ctx.api).await;
                    output_page(output_format, path, Some(&session), &page)
                }
                ProfileCommands::Update {
                    name,
                    specialty,
                    experience,
                    bio,
                    image,
                } => {
                    let update = DoctorProfileUpdate {
                        name,
                        specialty,
                        bio,
                        experience,
                    };
                    // An image alone is a valid update
                    if !update.is_empty() || image.is_none() {
                        if let Err(e) = page.update(&ctx.api, &update).await {
                            return report_client_error(output_format, e);
                        }
                    }
                    if let Some(path) = image {
                        let upload = load_image(&path)?;
                        if let Err(e) = page.update_image(&ctx.api, &upload).await {
                            return report_client_error(output_format, e);
                        }
                    }
                    output_success(output_format, "Profile updated", Some(page.to_json()))
                }
            }
        }
    }
}
