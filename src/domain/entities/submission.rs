use crate::{constants::ADD_IMAGE_PERMISSION, entities::token::Claims};

/// The user behind a web or API submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitter {
    pub user_id: String,
    pub username: String,
    pub permissions: Vec<String>,
}

impl Submitter {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn is_trusted(&self) -> bool {
        self.has_permission(ADD_IMAGE_PERMISSION)
    }
}

impl From<&Claims> for Submitter {
    fn from(claims: &Claims) -> Self {
        Submitter {
            user_id: claims.sub.clone(),
            username: claims.username.clone(),
            permissions: claims.permissions.clone(),
        }
    }
}

/// Events raised by image submissions, delivered outside the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageEvent {
    UntrustedSubmission {
        username: String,
        image_name: String,
        exercise_base_id: i64,
    },
}

impl ImageEvent {
    /// Subject and body of the admin mail for this event
    pub fn admin_message(&self) -> (String, String) {
        match self {
            ImageEvent::UntrustedSubmission { username, image_name, exercise_base_id } => (
                "New user submitted image".to_string(),
                format!(
                    "The user {} submitted a new image \"{}\" for exercise {}.",
                    username, image_name, exercise_base_id
                ),
            ),
        }
    }
}
