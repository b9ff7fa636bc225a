use nooma_core::RecordId;

/// Outcome envelope returned by every write action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the write happened.
    pub ok: bool,
    /// Id of the affected record on success.
    pub id: Option<RecordId>,
    /// User-facing message.
    pub message: String,
}

impl ActionResponse {
    pub fn success(message: impl Into<String>, id: RecordId) -> Self {
        Self {
            ok: true,
            id: Some(id),
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}
