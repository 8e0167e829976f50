use crate::extract::FileKind;
use crate::models::keys;

/// 构造抽取提示词, 按来源区分 "PDF invoice" / "invoice image"
pub fn build_prompt(kind: FileKind) -> String {
    let source = if kind.is_pdf() { "PDF invoice" } else { "invoice image" };
    format!(
        "Extract ALL data from this {source} as JSON with:
- vendor details (name, address, contact)
- invoice number, invoice date, due date
- ALL line items (description, quantity, unit price, amount)
- subtotal, taxes, discounts, total
- payment terms, notes
Use these keys: {vendor}, {address}, {contact}, {number}, {date}, {due}, \
{items} (each with {desc}, {qty}, {price}, {amount}), {subtotal}, {tax}, {discount}, \
{total}, {terms}, {notes}.
Use null for fields you cannot determine.
Return ONLY valid JSON.",
        vendor = keys::VENDOR_NAME,
        address = keys::VENDOR_ADDRESS,
        contact = keys::VENDOR_CONTACT,
        number = keys::INVOICE_NUMBER,
        date = keys::DATE,
        due = keys::DUE_DATE,
        items = keys::ITEMS,
        desc = keys::DESCRIPTION,
        qty = keys::QUANTITY,
        price = keys::UNIT_PRICE,
        amount = keys::AMOUNT,
        subtotal = keys::SUBTOTAL,
        tax = keys::TAX_AMOUNT,
        discount = keys::DISCOUNT,
        total = keys::TOTAL_AMOUNT,
        terms = keys::PAYMENT_TERMS,
        notes = keys::NOTES,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_framing_by_source() {
        assert!(build_prompt(FileKind::Pdf).contains("this PDF invoice"));
        assert!(build_prompt(FileKind::Png).contains("this invoice image"));
        assert!(build_prompt(FileKind::Jpeg).contains("this invoice image"));
    }

    #[test]
    fn test_prompt_names_every_field() {
        let prompt = build_prompt(FileKind::Pdf);
        for key in [
            "vendorName", "vendorAddress", "vendorContact", "invoiceNumber", "dueDate",
            "items", "unitPrice", "subtotal", "taxAmount", "discount", "totalAmount",
            "paymentTerms", "notes",
        ] {
            assert!(prompt.contains(key), "missing {key}");
        }
        assert!(prompt.ends_with("Return ONLY valid JSON."));
    }
}
