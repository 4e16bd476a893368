/*
 * Monad Tunnel Showcase
 *
 * An interactive tour of a blockchain ecosystem directory. Scroll, use the
 * arrow keys or swipe to travel down a tunnel of floating dapp tiles; click
 * the logo at the end to search, either with manual filters or by asking the
 * AI oracle, and warp into a constellation of the results.
 *
 * Usage: dapp_tunnel [config.toml]
 * Logging is controlled with RUST_LOG (e.g. RUST_LOG=dapp_tunnel=debug).
 */

use dapp_tunnel::app;

fn main() {
    env_logger::init();
    nannou::app(app::model).update(app::update).run();
}
