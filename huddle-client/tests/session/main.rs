
mod test_close;
mod test_failures;
mod test_reactions;
mod test_roles;
mod test_speaking;

use std::sync::Once;

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("huddle_client=debug")
            .try_init();
    });
}
