use clap::{Parser, Subcommand};
use medref_core::hospital::{HospitalDirectory, HospitalInput};
use medref_core::patient::PatientDirectory;
use medref_core::store::ReferralStore;
use medref_core::users::{NewUser, UserDirectory};
use medref_core::workflow::expire_overdue;
use medref_core::{Actor, CoreConfig, Role, SlaPolicy};
use medref_types::{EmailAddress, NonEmptyText};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "medref")]
#[command(about = "Hospital referral system operator CLI")]
struct Cli {
    /// Data directory (defaults to $MEDREF_DATA_DIR or ./medref_data)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all referrals
    ListReferrals,
    /// List all patients
    ListPatients,
    /// List all hospitals
    ListHospitals,
    /// Register a hospital
    CreateHospital {
        /// Hospital name
        name: String,
        /// Contact email
        email: String,
        /// Postal address (optional)
        #[arg(long)]
        address: Option<String>,
        /// Contact phone (optional)
        #[arg(long)]
        phone: Option<String>,
    },
    /// Create a system administrator account
    CreateAdmin {
        /// Full name
        name: String,
        /// Login email
        email: String,
    },
    /// Expire referrals past their SLA window
    ExpireSweep,
}

/// Synthetic actor for operator commands run directly against the data
/// directory, outside any session.
fn operator() -> Result<Actor, medref_types::TextError> {
    Ok(Actor {
        id: Uuid::new_v4(),
        full_name: NonEmptyText::new("Operator")?,
        email: EmailAddress::new("operator@medref.local")?,
        role: Role::SystemAdmin,
        hospital_id: None,
        is_active: true,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .or_else(|| std::env::var("MEDREF_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./medref_data"));
    let cfg = Arc::new(CoreConfig::new(data_dir, SlaPolicy::default())?);

    match cli.command {
        Some(Commands::ListReferrals) => {
            let store = ReferralStore::open(cfg)?;
            let referrals = store.list_all();
            if referrals.is_empty() {
                println!("No referrals found.");
            } else {
                for r in referrals {
                    println!(
                        "{} [{}] {} — patient {} ({}), created {}",
                        r.referral_code, r.status, r.urgency, r.patient_name, r.patient_phone,
                        r.created_at
                    );
                }
            }
        }
        Some(Commands::ListPatients) => {
            let patients = PatientDirectory::open(cfg)?;
            let all = patients.list();
            if all.is_empty() {
                println!("No patients found.");
            } else {
                for p in all {
                    println!(
                        "ID: {}, Name: {}, Phone: {}, DOB: {}",
                        p.id, p.full_name, p.phone, p.date_of_birth
                    );
                }
            }
        }
        Some(Commands::ListHospitals) => {
            let hospitals = HospitalDirectory::open(cfg)?;
            let all = hospitals.list();
            if all.is_empty() {
                println!("No hospitals found.");
            } else {
                for h in all {
                    println!("ID: {}, Name: {}, Email: {}", h.id, h.name, h.email);
                }
            }
        }
        Some(Commands::CreateHospital {
            name,
            email,
            address,
            phone,
        }) => {
            let hospitals = HospitalDirectory::open(cfg)?;
            let input = HospitalInput {
                name: Some(name),
                email: Some(email),
                address,
                phone,
            };
            match hospitals.create(&operator()?, input) {
                Ok(hospital) => println!("Created hospital {} ({})", hospital.name, hospital.id),
                Err(e) => eprintln!("Error creating hospital: {}", e),
            }
        }
        Some(Commands::CreateAdmin { name, email }) => {
            let users = UserDirectory::open(cfg)?;
            let new_user = NewUser {
                full_name: NonEmptyText::new(&name)?,
                email: EmailAddress::new(&email)?,
                role: Role::SystemAdmin,
                hospital_id: None,
            };
            match users.create(&operator()?, new_user) {
                Ok(user) => println!("Created system admin {} ({})", user.email, user.id),
                Err(e) => eprintln!("Error creating admin: {}", e),
            }
        }
        Some(Commands::ExpireSweep) => {
            let store = ReferralStore::open(cfg.clone())?;
            match expire_overdue(&store, cfg.sla(), chrono::Utc::now()) {
                Ok(expired) if expired.is_empty() => println!("Nothing to expire."),
                Ok(expired) => {
                    for r in &expired {
                        println!("Expired {} (was overdue {})", r.referral_code, r.urgency);
                    }
                    println!("Expired {} referral(s).", expired.len());
                }
                Err(e) => eprintln!("Error running expiry sweep: {}", e),
            }
        }
        None => {
            println!("Use 'medref --help' for commands");
        }
    }

    Ok(())
}
