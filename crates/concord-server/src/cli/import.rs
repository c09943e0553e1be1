use crate::cli::ImportArgs;
use crate::config::ConcordConfig;
use anyhow::{Context, Result};
use concord_core::store::import::{assign_missing_ids, read_entities, ImportFormat};
use concord_core::{EntityStore, EntityType, RedbEntityStore};
use std::fs::File;
use std::io::BufReader;

pub async fn run(args: ImportArgs, config: ConcordConfig) -> Result<()> {
    let path = &args.file;

    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let format = match &args.format {
        Some(name) => ImportFormat::parse(name)?,
        None => ImportFormat::from_path(path),
    };

    println!("Importing {} as {:?}...", path.display(), format);

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut entities = read_entities(BufReader::new(file), format)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if let Some(entity_type) = &args.entity_type {
        let entity_type = EntityType::new(entity_type.as_str());
        for entity in &mut entities {
            entity.entity_type = entity_type.clone();
        }
    }

    let assigned = assign_missing_ids(&mut entities);
    println!("Parsed {} entities ({} new ids)", entities.len(), assigned);

    if args.dry_run {
        println!("Dry run: no changes written.");
        for entity in &entities {
            println!("  [{}] {} ({})", entity.entity_type, entity.name, entity.id);
        }
        return Ok(());
    }

    let store = RedbEntityStore::open(config.db_path())?;
    store.put_entities_batch(&entities)?;

    println!(
        "✅ Imported {} entities ({} total in store)",
        entities.len(),
        store.count()?
    );

    Ok(())
}
