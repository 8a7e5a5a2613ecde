// Module exports for pure logic
pub mod content_view;    // View contract + events
pub mod drag;            // Pointer-driven reordering
pub mod navigation;      // Address input + nav sync
pub mod search_server;   // Search redirect service
pub mod tabs;            // Tab registry
pub mod transition;      // Tab switch animation
