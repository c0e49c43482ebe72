use crate::compute::Categories;

/// Plain text report, one block per category.
pub(crate) fn write_summaries<W: std::io::Write>(
    mut writer: W,
    categories: &Categories,
) -> Result<(), anyhow::Error> {
    writeln!(writer, "this is the following data in the csv file")?;
    for category in categories.iter() {
        let earliest = category.earliest()?;
        let latest = category.latest()?;
        writeln!(writer, "category: {}", category.name())?;
        writeln!(
            writer,
            "earliest: violation_id: {} time_stamp {}",
            earliest.id, earliest.entered
        )?;
        writeln!(
            writer,
            "latest: violation_id: {} time_stamp {}",
            latest.id, latest.entered
        )?;
        writeln!(writer, "total: {}", category.count())?;
    }
    writer.flush()?;
    Ok(())
}
