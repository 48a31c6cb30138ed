use chrono::Utc;
use serde::Serialize;

/// Room and participant names generated for one connect attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionIdentity {
    pub room_name: String,
    pub participant_name: String,
}

impl SessionIdentity {
    pub fn generate() -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();

        Self {
            room_name: format!("room-{}", Utc::now().timestamp_millis()),
            participant_name: format!("user-{}", &suffix[..7]),
        }
    }
}
