pub mod models;
pub mod users;
pub mod sessions;
pub mod quiz;
pub mod chats;

pub use models::{
    Chat, ChatMessage, MessageRole, ProfileUpdate, QuizProgressRow, QuizResult, Session, User,
    UserProfile,
};
pub use users::UserRepository;
pub use sessions::SessionRepository;
pub use quiz::QuizRepository;
pub use chats::ChatRepository;
