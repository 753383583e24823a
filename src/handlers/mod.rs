// handlers/mod.rs - Handler tiers
//
// Public (no session) → Admin (session + allowlist + admin role)
//                     → Owner-or-admin (session + allowlist + admin role or resource owner)
//
// Admin routes are gated by `middleware::require_admin` at the router level.
// Owner-or-admin handlers call `AuthorizationGuard::authorize_owner_or_admin`
// themselves because they need the resource in hand.
pub mod admin;
pub mod system;
