/*!
 * Access token extractor
 *
 * Responsibility:
 * - hand the claims validated by the authorization gate to handlers
 * - per request by construction (read from request extensions, not the shared claims context)
 *
 * Public API:
 * - AccessToken
 */

mod core;

pub use core::AccessToken;
