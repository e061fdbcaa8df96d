use serde::Serialize;

use crate::models::ConsultationType;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparationItem {
    pub text: String,
    pub required: bool,
}

/// What the review step tells the patient about a consultation type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsultationDetails {
    pub consultation_type: ConsultationType,
    pub title: String,
    pub description: String,
    pub duration_minutes: u32,
    /// Display string, e.g. `$50.00`.
    pub fee: String,
    pub location: Option<String>,
    pub preparation: Vec<PreparationItem>,
    pub additional_notes: Vec<String>,
    pub notice: String,
}

impl ConsultationDetails {
    pub fn duration_label(&self) -> String {
        format!("{} minutes", self.duration_minutes)
    }
}

fn items(entries: &[(&str, bool)]) -> Vec<PreparationItem> {
    entries
        .iter()
        .map(|(text, required)| PreparationItem {
            text: text.to_string(),
            required: *required,
        })
        .collect()
}

fn remote_preparation() -> Vec<PreparationItem> {
    items(&[
        ("Stable internet connection", true),
        ("Quiet environment", true),
        ("Medical history documents", false),
    ])
}

pub fn consultation_details(kind: ConsultationType, clinic_location: &str) -> ConsultationDetails {
    match kind {
        ConsultationType::InPerson => ConsultationDetails {
            consultation_type: kind,
            title: "In-person Consultation".to_string(),
            description: "Connect with your doctor for a face-to-face visit at the clinic. Receive physical examinations, direct evaluation, prescriptions, and personalized treatment plans.".to_string(),
            duration_minutes: 20,
            fee: "$50.00".to_string(),
            location: Some(clinic_location.to_string()),
            preparation: items(&[
                ("National ID or passport", true),
                ("Previous medical records", true),
                ("Current prescriptions or medication list", true),
                ("Appointment confirmation", true),
            ]),
            additional_notes: vec![
                "Please arrive 10 minutes early.".to_string(),
                "Rescheduling allowed up to 2 hours before.".to_string(),
                "Emergency cases should visit nearest hospital.".to_string(),
            ],
            notice: "You will receive a confirmation email with your appointment details after booking.".to_string(),
        },
        ConsultationType::Video => ConsultationDetails {
            consultation_type: kind,
            title: "Video Consultation".to_string(),
            description: "Connect with healthcare professionals through secure video calls. Get medical advice, prescriptions, and follow-up care from the comfort of your home.".to_string(),
            duration_minutes: 15,
            fee: "$45.00".to_string(),
            location: None,
            preparation: remote_preparation(),
            additional_notes: Vec::new(),
            notice: "You'll receive a confirmation email with the video call link 30 minutes before your appointment.".to_string(),
        },
        ConsultationType::Chat => ConsultationDetails {
            consultation_type: kind,
            title: "Chat Consultation".to_string(),
            description: "Connect with healthcare professionals through secure chats. Get medical advice, prescriptions, and follow-up care from the comfort of your home.".to_string(),
            duration_minutes: 15,
            fee: "$45.00".to_string(),
            location: None,
            preparation: remote_preparation(),
            additional_notes: Vec::new(),
            notice: "You'll receive a confirmation email with the chat link 30 minutes before your appointment.".to_string(),
        },
    }
}
