use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde_json::json;

use crate::api::models::DoctorForm;
use crate::cli::utils::{load_image, output_page, output_success, report_client_error};
use crate::cli::CliContext;
use crate::pages::admin::{
    AdminAppointmentsPage, AdminDashboardPage, DoctorsPage, SpecialtiesPage, UsersPage,
};
use crate::pages::Page;
use crate::types::RecordId;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Counts of users, doctors, specialties and appointments")]
    Dashboard,

    #[command(about = "Manage user accounts")]
    Users {
        #[command(subcommand)]
        cmd: UserCommands,
    },

    #[command(about = "Manage doctor accounts")]
    Doctors {
        #[command(subcommand)]
        cmd: DoctorCommands,
    },

    #[command(about = "Manage specialties")]
    Specialties {
        #[command(subcommand)]
        cmd: SpecialtyCommands,
    },

    #[command(about = "List every appointment with its doctor")]
    Appointments,
}

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List users")]
    List,

    #[command(about = "Delete a user")]
    Delete {
        #[arg(help = "User id")]
        id: RecordId,
    },
}

#[derive(Args)]
pub struct DoctorFields {
    #[arg(long, help = "Doctor name")]
    pub name: String,
    #[arg(long, help = "Email address")]
    pub email: String,
    #[arg(long, help = "Specialty name")]
    pub specialty: String,
    #[arg(long, help = "Profile image (JPG/PNG/GIF, up to 5MB)")]
    pub image: Option<PathBuf>,
}

impl DoctorFields {
    fn into_form(self) -> anyhow::Result<DoctorForm> {
        let image = match &self.image {
            Some(path) => Some(load_image(path)?),
            None => None,
        };
        Ok(DoctorForm {
            name: self.name,
            email: self.email,
            specialty: self.specialty,
            image,
        })
    }
}

#[derive(Subcommand)]
pub enum DoctorCommands {
    #[command(about = "List doctors, one page at a time")]
    List {
        #[arg(long, default_value_t = 1, help = "Page number")]
        page: usize,
    },

    #[command(about = "Add a doctor")]
    Add {
        #[command(flatten)]
        fields: DoctorFields,
    },

    #[command(about = "Edit a doctor")]
    Update {
        #[arg(help = "Doctor id")]
        id: RecordId,
        #[command(flatten)]
        fields: DoctorFields,
    },

    #[command(about = "Delete a doctor")]
    Delete {
        #[arg(help = "Doctor id")]
        id: RecordId,
    },
}

#[derive(Subcommand)]
pub enum SpecialtyCommands {
    #[command(about = "List specialties, one page at a time")]
    List {
        #[arg(long, default_value_t = 1, help = "Page number")]
        page: usize,
    },

    #[command(about = "Add a specialty")]
    Add {
        #[arg(help = "Specialty name")]
        name: String,
    },

    #[command(about = "Rename a specialty")]
    Rename {
        #[arg(help = "Specialty id")]
        id: RecordId,
        #[arg(help = "New name")]
        name: String,
    },

    #[command(about = "Delete a specialty")]
    Delete {
        #[arg(help = "Specialty id")]
        id: RecordId,
    },
}

pub async fn handle(cmd: AdminCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let output_format = &ctx.output_format;
    match cmd {
        AdminCommands::Dashboard => {
            let path = "/admin/dashboard";
            let session = ctx.enter(path)?;
            let mut page = AdminDashboardPage::default();
            page.mount(&ctx.api).await;
            output_page(output_format, path, Some(&session), &page)
        }
        AdminCommands::Users { cmd } => {
            let path = "/admin/users";
            let session = ctx.enter(path)?;
            let mut page = UsersPage::default();
            match cmd {
                UserCommands::List => {
                    page.mount(&ctx.api).await;
                    output_page(output_format, path, Some(&session), &page)
                }
                UserCommands::Delete { id } => {
                    let confirm = ctx.confirm();
                    if let Err(e) = page.delete(&ctx.api, &id, confirm.as_ref()).await {
                        return report_client_error(output_format, e);
                    }
                    output_success(output_format, &format!("User {} deleted", id), Some(json!({ "id": id })))
                }
            }
        }
        AdminCommands::Doctors { cmd } => {
            let path = "/admin/doctors";
            let session = ctx.enter(path)?;
            let mut page = DoctorsPage::new(ctx.config.pages.doctors_per_page);
            match cmd {
                DoctorCommands::List { page: number } => {
                    page.mount(&ctx.api).await;
                    page.go_to_page(number);
                    output_page(output_format, path, Some(&session), &page)
                }
                DoctorCommands::Add { fields } => {
                    let form = fields.into_form()?;
                    if let Err(e) = page.save(&ctx.api, None, &form).await {
                        return report_client_error(output_format, e);
                    }
                    output_success(
                        output_format,
                        &format!("Doctor {} added", form.name.trim()),
                        Some(json!({ "total": page.doctors().len() })),
                    )
                }
                DoctorCommands::Update { id, fields } => {
                    let form = fields.into_form()?;
                    if let Err(e) = page.save(&ctx.api, Some(&id), &form).await {
                        return report_client_error(output_format, e);
                    }
                    output_success(output_format, &format!("Doctor {} updated", id), Some(json!({ "id": id })))
                }
                DoctorCommands::Delete { id } => {
                    let confirm = ctx.confirm();
                    if let Err(e) = page.delete(&ctx.api, &id, confirm.as_ref()).await {
                        return report_client_error(output_format, e);
                    }
                    output_success(output_format, &format!("Doctor {} deleted", id), Some(json!({ "id": id })))
                }
            }
        }
        AdminCommands::Specialties { cmd } => {
            let path = "/admin/specialties";
            let session = ctx.enter(path)?;
            let mut page = SpecialtiesPage::new(ctx.config.pages.specialties_per_page);
            match cmd {
                SpecialtyCommands::List { page: number } => {
                    page.mount(&ctx.api).await;
                    page.go_to_page(number);
                    output_page(output_format, path, Some(&session), &page)
                }
                SpecialtyCommands::Add { name } => match page.add(&ctx.api, &name).await {
                    Ok(created) => output_success(
                        output_format,
                        &format!("Specialty '{}' added", created.name),
                        Some(json!({ "specialty": created })),
                    ),
                    Err(e) => report_client_error(output_format, e),
                },
                SpecialtyCommands::Rename { id, name } => {
                    if let Err(e) = page.rename(&ctx.api, &id, &name).await {
                        return report_client_error(output_format, e);
                    }
                    output_success(
                        output_format,
                        &format!("Specialty {} renamed to '{}'", id, name.trim()),
                        Some(json!({ "id": id, "name": name.trim() })),
                    )
                }
                SpecialtyCommands::Delete { id } => {
                    let confirm = ctx.confirm();
                    if let Err(e) = page.delete(&ctx.api, &id, confirm.as_ref()).await {
                        return report_client_error(output_format, e);
                    }
                    output_success(output_format, &format!("Specialty {} deleted", id), Some(json!({ "id": id })))
                }
            }
        }
        AdminCommands::Appointments => {
            let path = "/admin/appointments";
            let session = ctx.enter(path)?;
            let mut page = AdminAppointmentsPage::default();
            page.mount(&ctx.api).await;
            output_page(output_format, path, Some(&session), &page)
        }
    }
}
