
pub use assertions::{
    assert_entity_removed, assert_init, assert_patch, global, payload_for, KnowledgeTracker,
};
pub use packet_exchange::{exchange_payloads, exchange_payloads_n_times};
pub use test_client::TestClient;
pub use test_server::TestServer;
