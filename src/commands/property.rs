use crate::args::{PropertyKeyArgs, PropertySetArgs};
use crate::commands::Out;
use crate::{utils, Config, Result};
use anyhow::bail;

/// Prints one property value. The message is the bare value so it can be
/// piped into other tools.
pub async fn property_get(config: Config, args: PropertyKeyArgs) -> Result<Out<String>> {
    let Some(value) = config.db().get_property(&args.key).await? else {
        bail!("No property named '{}'", args.key);
    };
    Ok(Out::new(value.clone(), value))
}

pub async fn property_set(config: Config, args: PropertySetArgs) -> Result<Out<()>> {
    config.db().set_property(&args.key, &args.value).await?;
    Ok(format!("Set property '{}'", args.key).into())
}

pub async fn property_delete(config: Config, args: PropertyKeyArgs) -> Result<Out<()>> {
    config.db().delete_property(&args.key).await?;
    Ok(format!("Deleted property '{}'", args.key).into())
}

pub async fn property_list(config: Config) -> Result<Out<Vec<(String, String)>>> {
    let properties = config.db().list_properties().await?;
    if properties.is_empty() {
        return Ok("No properties stored".into());
    }

    let rows: Vec<Vec<String>> = properties
        .iter()
        .map(|(key, value)| vec![key.clone(), value.clone()])
        .collect();
    let table = utils::render_table(&["Key", "Value"], &rows)?;

    let count = properties.len();
    let message = format!(
        "{count} propert{}\n\n{table}",
        if count == 1 { "y" } else { "ies" }
    );
    Ok(Out::new(message, properties))
}
