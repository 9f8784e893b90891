/*
 * Responsibility
 * - public middleware surface
 * - authorization: bearer token gate (verify → scope → claims context)
 * - http: request id / trace / body limit / timeout
 */
pub mod authorization;
pub mod http;
