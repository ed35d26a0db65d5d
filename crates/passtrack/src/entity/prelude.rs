//! Common re-exports for convenient entity usage.

pub use super::beatmap::{
    ActiveModel as BeatmapActiveModel, Column as BeatmapColumn, Entity as Beatmap,
    Model as BeatmapModel,
};
pub use super::completion::{
    ActiveModel as CompletionActiveModel, Column as CompletionColumn, Entity as Completion,
    Model as CompletionModel,
};
pub use super::mapset::{
    ActiveModel as MapsetActiveModel, Column as MapsetColumn, Entity as Mapset,
    Model as MapsetModel,
};
pub use super::ruleset::Ruleset;
pub use super::update_task::{
    ActiveModel as UpdateTaskActiveModel, Column as UpdateTaskColumn, Entity as UpdateTask,
    Model as UpdateTaskModel,
};
pub use super::user::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as User, Model as UserModel,
};
