pub mod players;

pub use players::PlayerRepo;
