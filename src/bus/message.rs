use uuid::Uuid;

/// Commands consumed by the model worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelCommand {
    CreateModel { uid: Uuid },
    DeleteModel { uid: Uuid },
}

impl ModelCommand {
    pub fn uid(&self) -> Uuid {
        match self {
            ModelCommand::CreateModel { uid } | ModelCommand::DeleteModel { uid } => *uid,
        }
    }
}
