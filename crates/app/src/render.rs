use engine::{LedgerChange, LedgerObserver, PricingShape, ServiceEntry, render_description_for_display};

/// Prints the routed section every time its ledger changes.
#[derive(Debug, Default)]
pub struct ConsoleRenderer;

impl LedgerObserver for ConsoleRenderer {
    fn ledger_changed(&self, change: &LedgerChange<'_>) {
        tracing::debug!("{} section of {} changed", change.vertical, change.document_id);
        println!("{} services:", change.vertical);
        for line in service_lines(change.entries) {
            println!("  {line}");
        }
        println!("  section total {}", change.total);
    }
}

/// One display line per entry, or the placeholder for an empty section.
pub fn service_lines(entries: &[ServiceEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["(no services added yet)".to_string()];
    }
    entries.iter().map(service_line).collect()
}

fn service_line(entry: &ServiceEntry) -> String {
    let description = render_description_for_display(&entry.description);
    match &entry.pricing {
        PricingShape::Itemized {
            quantity,
            unit,
            rate,
        } => format!(
            "[{}] {} ({quantity} {unit} x {rate}) {}",
            entry.id,
            description.as_str(),
            entry.amount()
        ),
        PricingShape::Custom { .. } => {
            format!("[{}] {} {}", entry.id, description.as_str(), entry.amount())
        }
    }
}

#[cfg(test)]
mod tests {
    use engine::{BusinessVertical, MoneyCents, Quantity, build_custom, build_itemized};

    use super::*;

    #[test]
    fn empty_section_shows_placeholder() {
        assert_eq!(service_lines(&[]), vec!["(no services added yet)"]);
    }

    #[test]
    fn lines_show_amounts_and_escaped_text() {
        let itemized = build_itemized(
            BusinessVertical::Concrete,
            "Driveway leveling",
            Quantity::whole(120),
            "sqft",
            MoneyCents::from(450),
        )
        .unwrap();
        let custom = build_custom(
            BusinessVertical::Masonry,
            "Brick & mortar\nrepair",
            MoneyCents::from(85_000),
        )
        .unwrap();

        let lines = service_lines(&[itemized, custom]);
        assert!(lines[0].ends_with("Driveway leveling (120 sqft x $4.50) $540.00"));
        assert!(lines[1].contains("Brick &amp; mortar<br>repair $850.00"));
    }
}
