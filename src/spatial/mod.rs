pub mod proximity;

pub use proximity::nearby_agents;
