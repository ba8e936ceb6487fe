//! Relations between entities.

/// Cardinality of a relation, seen from its source entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// One-to-one relation (unique foreign key).
    OneToOne,
    /// Many-to-one relation (foreign key on the source side).
    ManyToOne,
    /// One-to-many relation (foreign key on the many side).
    OneToMany,
}

/// The relations of the order graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Order -> Member.
    OrderMember,
    /// Order -> Delivery.
    OrderDelivery,
    /// Order -> OrderItem.
    OrderItems,
    /// OrderItem -> Item.
    OrderItemItem,
}

impl Relation {
    /// Relation name as used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Relation::OrderMember => "order.member",
            Relation::OrderDelivery => "order.delivery",
            Relation::OrderItems => "order.order_items",
            Relation::OrderItemItem => "order_item.item",
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            Relation::OrderMember => Cardinality::ManyToOne,
            Relation::OrderDelivery => Cardinality::OneToOne,
            Relation::OrderItems => Cardinality::OneToMany,
            Relation::OrderItemItem => Cardinality::ManyToOne,
        }
    }

    /// Whether joining this relation repeats the source row once per target.
    pub fn multiplies_rows(&self) -> bool {
        self.cardinality() == Cardinality::OneToMany
    }
}
