//! Static location reference tree: State → District → Mandal → GramPanchayat.
//! Rows keep the integer ids from the upstream election-data CSV.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct District {
    pub id: u32,
    pub state_id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mandal {
    pub id: u32,
    pub district_id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GramPanchayat {
    pub id: u32,
    pub mandal_id: u32,
    pub name: String,
}
