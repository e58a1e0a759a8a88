//! # Askboard Repository
//!
//! Durable storage for questions and their counters.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn QuestionRepository> / Arc<dyn CounterRepository>
//! MySqlQuestionRepository
//!   ↓  Arc<dyn DatabasePoolInterface>
//! MySQL
//! ```

pub mod mysql;
pub mod pool;
pub mod traits;

pub use mysql::*;
pub use pool::*;
pub use traits::*;
