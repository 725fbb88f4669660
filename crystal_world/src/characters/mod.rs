pub mod anims;
pub mod enemies;
pub mod enemy;
pub mod patrol;
pub mod player;

pub use enemies::{Enemies, EnemyDescriptor, EnemyRegistry, SpawnError};
pub use enemy::Enemy;
pub use patrol::{PatrolProbe, ProbeConfig, ProbeHit};
pub use player::{Player, PlayerTick};
