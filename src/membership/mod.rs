// Membership module - THE STATIC ROSTER
// Fixed set of participating nodes and their addresses

mod roster;

pub use roster::{MembershipError, NodeAddress, NodeName, Peer, Roster, DEFAULT_PORT};
