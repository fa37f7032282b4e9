//! # Trellis Markup
//!
//! Textual form of a trellis [`Document`](trellis_model::Document).
//!
//! ```text
//! <ui:UXML xmlns:ui="Trellis.UI" xmlns:uie="Trellis.Editor">
//!     <ui:Template name="Card" src="../common/card.uxml" />
//!     <ui:VisualElement class="panel" style="width: 100px;">
//!         <Style src="main.uss" />
//!         <ui:Instance template="Card">
//!             <AttributeOverrides element-name="title" text="Hello" />
//!             <ui:Label text="Body" slot="content" />
//!         </ui:Instance>
//!     </ui:VisualElement>
//! </ui:UXML>
//! ```

pub mod error;
pub mod names;
pub mod reader;
pub mod serializer;
pub mod style_text;

pub use error::{MarkupError, MarkupResult};
pub use names::{tag_for_type, type_for_tag, SELECTED_MARKER_ATTRIBUTE};
pub use reader::{parse, Reader};
pub use serializer::{serialize, SerializeOptions, Serializer};
pub use style_text::{InlineStyleCodec, StyleRuleCodec};
