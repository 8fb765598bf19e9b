pub mod list;
pub mod task;
pub mod user;

pub use list::{InvalidListId, List, ListDeleteForm, ListForm, ListId};
pub use task::{NewTask, Task, TaskForm, TaskId};
pub use user::{LoginForm, RegisterForm, User, UserId, UserLookup};
