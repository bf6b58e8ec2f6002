/// Application name
pub const APP_NAME: &str = "Agora";

/// Name of the channel every team member lands in. Only guests may leave it.
pub const DEFAULT_CHANNEL_NAME: &str = "town-square";

/// Role carried by guest accounts.
pub const SYSTEM_GUEST_ROLE: &str = "system_guest";

/// Role carried by regular accounts.
pub const SYSTEM_USER_ROLE: &str = "system_user";

/// Wire name of the event clients receive after a batch membership change.
/// Clients refresh their membership state on it, so adds reuse it too.
pub const EVENT_USER_REMOVED: &str = "user_removed";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8065;

/// Default capacity of the in-process event broadcast channel
pub const DEFAULT_EVENT_BUFFER: usize = 256;
