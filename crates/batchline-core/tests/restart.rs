use batchline_core::impls::ListItemSource;
use batchline_core::{
    CountingItemReader, DelegatingItemReader, ExecutionContext, ItemReader, ItemStream,
    ReaderError, StreamState, shared,
};

type Reader = DelegatingItemReader<CountingItemReader<ListItemSource<u32>>>;

fn assemble(items: &[u32]) -> Result<Reader, ReaderError> {
    let inner = CountingItemReader::new(ListItemSource::new(items.to_vec())).with_name("ids");
    DelegatingItemReader::builder().delegate(shared(inner)).build()
}

/// Reads in chunks of `commit_interval`, checkpointing to JSON after each
/// chunk. Stops without closing after `crash_after` items, like a killed process.
async fn run(
    reader: &mut Reader,
    ctx: &mut ExecutionContext,
    commit_interval: usize,
    crash_after: Option<usize>,
) -> (Vec<u32>, String) {
    let mut seen = Vec::new();
    let mut persisted = ctx.to_json().unwrap();
    reader.open(ctx).await.unwrap();
    loop {
        let mut chunk = Vec::new();
        while chunk.len() < commit_interval {
            match reader.read().await.unwrap() {
                Some(id) => chunk.push(id),
                None => break,
            }
        }
        let done = chunk.len() < commit_interval;
        seen.extend(chunk);
        reader.update(ctx).await.unwrap();
        if ctx.is_dirty() {
            persisted = ctx.to_json().unwrap();
            ctx.clear_dirty();
        }
        if crash_after.is_some_and(|n| seen.len() >= n) {
            return (seen, persisted);
        }
        if done {
            break;
        }
    }
    reader.close(ctx).await.unwrap();
    (seen, persisted)
}

#[tokio::test]
async fn crash_and_restart_reads_every_item_once() {
    let items: Vec<u32> = (100..110).collect();

    let mut first = assemble(&items).unwrap();
    let mut ctx = ExecutionContext::new();
    let (before, persisted) = run(&mut first, &mut ctx, 3, Some(6)).await;
    assert_eq!(before, items[..6]);
    drop(first);

    let mut restored = ExecutionContext::from_json(&persisted).unwrap();
    assert_eq!(restored.get_long("ids.read.count").unwrap(), Some(6));

    let mut second = assemble(&items).unwrap();
    let (after, _) = run(&mut second, &mut restored, 3, None).await;
    assert_eq!(after, items[6..]);
    assert_eq!(second.state(), StreamState::Closed);
}

#[tokio::test]
async fn uninterrupted_run_matches_source() {
    let items: Vec<u32> = (1..=7).collect();
    let mut reader = assemble(&items).unwrap();
    let mut ctx = ExecutionContext::new();

    let (seen, persisted) = run(&mut reader, &mut ctx, 4, None).await;

    assert_eq!(seen, items);
    let final_ctx = ExecutionContext::from_json(&persisted).unwrap();
    assert_eq!(final_ctx.get_long("ids.read.count").unwrap(), Some(7));
}

#[test]
fn assembly_without_inner_reader_is_refused() {
    let result = DelegatingItemReader::<CountingItemReader<ListItemSource<u32>>>::builder().build();
    assert!(matches!(result, Err(ReaderError::MissingCollaborator { .. })));
}
