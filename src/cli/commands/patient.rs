use chrono::Local;
use clap::Subcommand;
use serde_json::json;

use crate::api::models::PatientProfile;
use crate::cli::utils::{output_empty_collection, output_page, output_success, report_client_error};
use crate::cli::CliContext;
use crate::pages::availability::SlotOption;
use crate::pages::patient::{
    BookingPage, DoctorSearchPage, PatientAppointmentsPage, PatientDashboardPage, PatientProfilePage,
    APPOINTMENTS_PATH,
};
use crate::pages::Page;
use crate::routing::{BookingQuery, Route};
use crate::session::Session;
use crate::types::RecordId;

#[derive(Subcommand)]
pub enum PatientCommands {
    #[command(about = "Upcoming appointments")]
    Dashboard,

    #[command(about = "Search doctors by name and specialty")]
    Search {
        #[arg(long, help = "Part of the doctor's name")]
        name: Option<String>,
        #[arg(long, help = "Exact specialty")]
        specialty: Option<String>,
    },

    #[command(about = "Book an appointment; without a slot, lists the doctor's slots")]
    Book {
        #[arg(long, help = "Doctor id")]
        doctor: RecordId,
        #[arg(help = "Slot such as 'monday 09:00-10:00'")]
        slot: Option<String>,
    },

    #[command(about = "Move an appointment to another slot")]
    Reschedule {
        #[arg(help = "Appointment id")]
        id: RecordId,
        #[arg(help = "Slot such as 'monday 09:00-10:00'")]
        slot: Option<String>,
        #[arg(long, help = "Book with a different doctor")]
        doctor: Option<RecordId>,
    },

    #[command(about = "Cancel an appointment")]
    Cancel {
        #[arg(help = "Appointment id")]
        id: RecordId,
    },

    #[command(about = "List your appointments")]
    Appointments,

    #[command(about = "Your profile")]
    Profile {
        #[command(subcommand)]
        cmd: ProfileCommands,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    #[command(about = "Show your profile")]
    Show,

    #[command(about = "Update name, email or phone")]
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

pub async fn handle(cmd: PatientCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let output_format = &ctx.output_format;
    match cmd {
        PatientCommands::Dashboard => {
            let path = "/patient/dashboard";
            let session = ctx.enter(path)?;
            let mut page = PatientDashboardPage::new(session.display_name().to_string());
            page.mount(&ctx.api).await;
            output_page(output_format, path, Some(&session), &page)
        }
        PatientCommands::Search { name, specialty } => {
            let path = "/patient/search";
            let session = ctx.enter(path)?;
            let mut page = DoctorSearchPage::with_filters(name.unwrap_or_default(), specialty);
            page.mount(&ctx.api).await;
            if page.error().is_none() && page.filtered().is_empty() {
                return output_empty_collection(output_format, "doctors", "No doctors match your search.");
            }
            output_page(output_format, path, Some(&session), &page)
        }
        PatientCommands::Book { doctor, slot } => {
            let query = BookingQuery {
                doctor: Some(doctor),
                ..BookingQuery::default()
            };
            book(ctx, query, slot).await
        }
        PatientCommands::Reschedule { id, slot, doctor } => {
            let query = BookingQuery {
                doctor,
                appointment: Some(id),
                reschedule: true,
            };
            book(ctx, query, slot).await
        }
        PatientCommands::Cancel { id } => {
            let path = APPOINTMENTS_PATH;
            ctx.enter(path)?;
            let mut page = PatientAppointmentsPage::default();
            let confirm = ctx.confirm();
            if let Err(e) = page.cancel(&ctx.api, &id, confirm.as_ref()).await {
                return report_client_error(output_format, e);
            }
            output_success(output_format, &format!("Appointment {} cancelled", id), Some(json!({ "id": id })))
        }
        PatientCommands::Appointments => {
            let path = APPOINTMENTS_PATH;
            let session = ctx.enter(path)?;
            let mut page = PatientAppointmentsPage::default();
            page.mount(&ctx.api).await;
            output_page(output_format, path, Some(&session), &page)
        }
        PatientCommands::Profile { cmd } => {
            let path = "/patient/profile";
            let session = ctx.enter(path)?;
            let mut page = PatientProfilePage::default();
            page.mount(&ctx.api).await;
            match cmd {
                ProfileCommands::Show => output_page(output_format, path, Some(&session), &page),
                ProfileCommands::Update { name, email, phone } => {
                    let current = page.profile().cloned().unwrap_or_default();
                    let updated = PatientProfile {
                        name: name.unwrap_or(current.name),
                        email: email.unwrap_or(current.email),
                        phone: phone.unwrap_or(current.phone),
                    };
                    if let Err(e) = page.save(&ctx.api, &updated).await {
                        return report_client_error(output_format, e);
                    }
                    output_success(output_format, "Profile updated", Some(page.to_json()))
                }
            }
        }
    }
}

/// Open the booking page for `query`; book the slot when one is given
async fn book(ctx: &CliContext, query: BookingQuery, slot: Option<String>) -> anyhow::Result<()> {
    let output_format = &ctx.output_format;
    let path = Route::Patient(crate::routing::PatientPage::Booking(query.clone())).to_string();
    let session: Session = ctx.enter(&path)?;

    let mut page = BookingPage::new(query);
    page.mount(&ctx.api).await;

    let Some(slot) = slot else {
        return output_page(output_format, &path, Some(&session), &page);
    };
    let option: SlotOption = slot.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    match page.book(&ctx.api, &option, Local::now().date_naive()).await {
        Ok(outcome) => {
            let message = match &outcome.rescheduled {
                Some(id) => format!("Appointment {} moved to {} at {}", id, outcome.date, outcome.time.format("%H:%M")),
                None => format!("Appointment booked for {} at {}", outcome.date, outcome.time.format("%H:%M")),
            };
            output_success(
                output_format,
                &message,
                Some(json!({ "booking": outcome, "redirect": APPOINTMENTS_PATH })),
            )
        }
        Err(e) => report_client_error(output_format, e),
    }
}
