/*!
# Factory Save

Factory Save is a library to decode the binary save files of a factory
building game into a stream of typed records.

```no_run
use factorysave::{DecodedSave, SaveExtractor};

let data = std::fs::read("assets/saves/first_base.sav")?;
let mut save = DecodedSave::default();
let summary = SaveExtractor::default().decode(&data, &mut save)?;

let header = save.header.as_ref().unwrap();
println!("{} ({} records)", header.session_name, summary.records);
for (path_name, record) in &save.records {
    println!("{} {}", record.class_name, path_name);
}
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Streaming

Saves of large factories hold millions of records. The decoder inflates the
compressed body chunk by chunk as it reads, and hands finished records to an
[`EventSink`] in batches instead of keeping them around. Any sink works: a
closure wrapped in [`FnSink`], an `mpsc::Sender` feeding another thread, or
the in memory [`DecodedSave`].

```no_run
use factorysave::{DecodeEvent, FnSink, SaveExtractor};

let data = std::fs::read("assets/saves/first_base.sav")?;
let extractor = SaveExtractor::builder().with_flush_batch(1000).build();
extractor.decode(&data, FnSink(|event: DecodeEvent| {
    if let DecodeEvent::Records(batch) = event {
        println!("{} records", batch.len());
    }
}))?;
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Unknown data

Anything the decoder does not recognize is either kept as raw bytes on the
record (`missing`) when the record's declared length allows it, or reported
as a [`Diagnostic`] before the decode fails with
[`SaveErrorKind::UnknownVariant`].
*/

mod catalog;
mod chunk;
mod deflate;
mod errors;
mod events;
mod extension;
mod extraction;
mod header;
pub mod models;
mod property;
mod reader;

#[cfg(test)]
mod testing;

pub use catalog::{Catalog, TRAILING_SLACK};
pub use chunk::*;
pub use errors::*;
pub use events::*;
pub use extension::*;
pub use extraction::*;
pub use header::*;
pub use property::{PropertyDecoder, NONE, TEXT_NONE_CULTURE_BUILD};
pub use reader::*;
