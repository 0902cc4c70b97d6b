/*!
 * Principal extractor
 *
 * Responsibility:
 * - セキュリティフィルタが解決した Principal を handler に提供する
 *
 * Public API:
 * - CurrentPrincipal
 */

mod core;

pub use core::CurrentPrincipal;
