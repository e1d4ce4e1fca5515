//! WebSocket Transport
//!
//! Clients connect to `/ws` (or `/`). Every text frame a client sends is
//! relayed verbatim to all other connected clients; the sender receives no
//! echo. Frames arriving from the server are plain text.
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:3000/ws');
//!
//! ws.onmessage = (event) => console.log('Received:', event.data);
//! ws.onopen = () => ws.send('hello');
//! ```

mod handler;

pub use handler::websocket_handler;
