use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use super::ApplicationError;

/// "Become a model" submission as posted by the site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationForm {
    pub gender: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub contact_number: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub date_of_birth: String,
    pub height: String,
    pub bust: String,
    pub waist: String,
    pub hips: String,
    pub shoe_size: String,
    pub hair_color: String,
    pub eye_color: String,
    pub instagram: String,
    pub message: String,
    pub headshot: Option<String>,
    #[serde(rename = "headshot_filename")]
    pub headshot_filename: Option<String>,
    pub full_profile: Option<String>,
    #[serde(rename = "fullProfile_filename")]
    pub full_profile_filename: Option<String>,
    pub half_profile: Option<String>,
    #[serde(rename = "halfProfile_filename")]
    pub half_profile_filename: Option<String>,
    pub full_length_profile: Option<String>,
    #[serde(rename = "fullLengthProfile_filename")]
    pub full_length_profile_filename: Option<String>,
}

/// One uploaded portfolio image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioImage<'a> {
    pub slot: &'static str,
    pub data: &'a str,
    pub filename: Option<&'a str>,
}

impl ApplicationForm {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// Provided image slots in form order.
    pub fn images(&self) -> Vec<PortfolioImage<'_>> {
        [
            ("headshot", &self.headshot, &self.headshot_filename),
            ("fullProfile", &self.full_profile, &self.full_profile_filename),
            ("halfProfile", &self.half_profile, &self.half_profile_filename),
            (
                "fullLengthProfile",
                &self.full_length_profile,
                &self.full_length_profile_filename,
            ),
        ]
        .into_iter()
        .filter_map(|(slot, data, filename)| {
            let data = data.as_deref().filter(|data| !data.trim().is_empty())?;
            Some(PortfolioImage {
                slot,
                data,
                filename: filename.as_deref().filter(|name| !name.trim().is_empty()),
            })
        })
        .collect()
    }

    pub fn validate(&self) -> Result<(), ApplicationError> {
        let required = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ApplicationError::Invalid(format!("{field} is required")));
            }
        }
        if !self.email.contains('@') {
            return Err(ApplicationError::Invalid(
                "email must be a valid address".to_string(),
            ));
        }

        for image in self.images() {
            if STANDARD.decode(strip_data_uri(image.data)).is_err() {
                return Err(ApplicationError::Invalid(format!(
                    "{} is not a valid base64 image",
                    image.slot
                )));
            }
        }
        Ok(())
    }
}

/// Drops a leading `data:image/<subtype>;base64,` prefix, leaving bare base64.
pub fn strip_data_uri(data: &str) -> &str {
    let Some(rest) = data.strip_prefix("data:image/") else {
        return data;
    };
    match rest.split_once(";base64,") {
        Some((subtype, payload))
            if !subtype.is_empty()
                && subtype
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            payload
        }
        _ => data,
    }
}
